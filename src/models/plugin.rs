use serde::{Deserialize, Serialize};

/// One plugin file tracked in a load order.
///
/// `id` is the lower-cased file name and is the identity used for every
/// comparison; `name` keeps the on-disk casing for display and for writing
/// `plugins.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginEntry {
    pub id: String,
    pub name: String,
    pub enabled: bool,

    /// Mod that supplies this file, if the mod manager tracks it
    pub owner_mod_id: Option<String>,

    /// Pinned entries cannot be reordered by the user
    pub locked: bool,

    /// The backing file could not be found in the data directory
    pub invalid: bool,
}

impl PluginEntry {
    /// Create a valid, unlocked entry for a plugin file
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        let name = name.into();
        Self {
            id: plugin_id(&name),
            name,
            enabled,
            owner_mod_id: None,
            locked: false,
            invalid: false,
        }
    }

    /// Attach the owning mod
    pub fn with_owner(mut self, owner_mod_id: Option<String>) -> Self {
        self.owner_mod_id = owner_mod_id;
        self
    }

    /// Mark the entry invalid. Invalid entries are pinned and never enabled.
    pub fn into_invalid(mut self) -> Self {
        self.invalid = true;
        self.locked = true;
        self.enabled = false;
        self
    }

    /// Whether the game will actually load this plugin
    pub fn is_effectively_enabled(&self) -> bool {
        self.enabled && !self.invalid
    }
}

/// A single line of `plugins.txt`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginListEntry {
    pub name: String,
    pub enabled: bool,
}

impl PluginListEntry {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }

    pub fn id(&self) -> String {
        plugin_id(&self.name)
    }
}

/// Case-insensitive identity of a plugin file name
pub fn plugin_id(name: &str) -> String {
    name.to_lowercase()
}

/// An ordered, duplicate-free sequence of plugins.
///
/// The position of an entry IS its load position in the game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOrder {
    entries: Vec<PluginEntry>,
}

impl LoadOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Returns false (and drops the entry) if its id is already present.
    pub fn push(&mut self, entry: PluginEntry) -> bool {
        if self.contains(&entry.id) {
            tracing::debug!("Dropping duplicate load order entry: {}", entry.name);
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn entries(&self) -> &[PluginEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [PluginEntry] {
        &mut self.entries
    }

    pub fn into_entries(self) -> Vec<PluginEntry> {
        self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PluginEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive lookup by file name or id
    pub fn position(&self, name: &str) -> Option<usize> {
        let id = plugin_id(name);
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&PluginEntry> {
        self.position(name).map(|index| &self.entries[index])
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    /// Names of the plugins the game will load, in load order.
    ///
    /// Invalid entries never appear here, whatever their `enabled` flag says.
    pub fn enabled_plugins(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.is_effectively_enabled())
            .map(|entry| entry.name.as_str())
            .collect()
    }

    pub fn invalid_entries(&self) -> impl Iterator<Item = &PluginEntry> {
        self.entries.iter().filter(|entry| entry.invalid)
    }
}

impl FromIterator<PluginEntry> for LoadOrder {
    fn from_iter<I: IntoIterator<Item = PluginEntry>>(iter: I) -> Self {
        let mut order = LoadOrder::new();
        for entry in iter {
            order.push(entry);
        }
        order
    }
}

impl IntoIterator for LoadOrder {
    type Item = PluginEntry;
    type IntoIter = std::vec::IntoIter<PluginEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a LoadOrder {
    type Item = &'a PluginEntry;
    type IntoIter = std::slice::Iter<'a, PluginEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl From<&[PluginListEntry]> for LoadOrder {
    /// Build an order straight from `plugins.txt` lines, trusting every file to exist
    fn from(list: &[PluginListEntry]) -> Self {
        list.iter()
            .map(|line| PluginEntry::new(line.name.clone(), line.enabled))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_id_is_lowercase() {
        let entry = PluginEntry::new("Knights.esp", true);
        assert_eq!(entry.id, "knights.esp");
        assert_eq!(entry.name, "Knights.esp");
    }

    #[test]
    fn test_push_rejects_duplicates_case_insensitively() {
        let mut order = LoadOrder::new();
        assert!(order.push(PluginEntry::new("Oblivion.esm", true)));
        assert!(!order.push(PluginEntry::new("oblivion.ESM", false)));
        assert_eq!(order.len(), 1);
        assert!(order.entries()[0].enabled);
    }

    #[test]
    fn test_invalid_entries_excluded_from_enabled_projection() {
        let order: LoadOrder = vec![
            PluginEntry::new("a.esm", true),
            PluginEntry {
                invalid: true,
                ..PluginEntry::new("ghost.esp", true)
            },
            PluginEntry::new("b.esp", false),
        ]
        .into_iter()
        .collect();

        assert_eq!(order.enabled_plugins(), vec!["a.esm"]);
        assert_eq!(order.invalid_entries().count(), 1);
    }

    #[test]
    fn test_into_invalid_pins_and_disables() {
        let entry = PluginEntry::new("ghost.esp", true).into_invalid();
        assert!(entry.invalid);
        assert!(entry.locked);
        assert!(!entry.enabled);
    }

    #[test]
    fn test_position_lookup() {
        let order: LoadOrder = ["A.esm", "B.esp"]
            .into_iter()
            .map(|name| PluginEntry::new(name, true))
            .collect();
        assert_eq!(order.position("b.ESP"), Some(1));
        assert_eq!(order.position("c.esp"), None);
    }
}
