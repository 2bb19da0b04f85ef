use super::plugin::plugin_id;

/// Native plugins shipped with Oblivion Remastered, in their required relative order.
pub const DEFAULT_NATIVE_PLUGINS: &[&str] = &[
    "oblivion.esm",
    "dlcbattlehorncastle.esp",
    "dlcfrostcrag.esp",
    "dlchorsearmor.esp",
    "dlcmehrunesrazor.esp",
    "dlcorrery.esp",
    "dlcshiveringisles.esp",
    "dlcspelltomes.esp",
    "dlcthievesden.esp",
    "dlcvilelair.esp",
    "knights.esp",
    "altarespmain.esp",
    "altardeluxe.esp",
    "altaresplocal.esp",
];

/// Shipped plugins that must not be loaded by default.
pub const DEFAULT_EXCLUDED_NATIVE_PLUGINS: &[&str] =
    &["altargymnavigation.esp", "tamrielleveledregion.esp"];

/// Read-only registry of the game's built-in plugins.
///
/// Natives must keep the registry's relative order wherever they sit in the
/// load order; they are not required to load first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativePluginRegistry {
    ordered: Vec<String>,
    excluded: Vec<String>,
}

impl NativePluginRegistry {
    pub fn new<I, J, S, T>(ordered: I, excluded: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut registry = Self {
            ordered: Vec::new(),
            excluded: Vec::new(),
        };
        for name in ordered {
            let id = plugin_id(name.as_ref());
            if !registry.ordered.contains(&id) {
                registry.ordered.push(id);
            }
        }
        for name in excluded {
            let id = plugin_id(name.as_ref());
            if !registry.excluded.contains(&id) && !registry.ordered.contains(&id) {
                registry.excluded.push(id);
            }
        }
        registry
    }

    /// Canonical position of a native plugin
    pub fn position(&self, name: &str) -> Option<usize> {
        let id = plugin_id(name);
        self.ordered.iter().position(|native| *native == id)
    }

    pub fn is_native(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        let id = plugin_id(name);
        self.excluded.iter().any(|excluded| *excluded == id)
    }

    pub fn ordered(&self) -> &[String] {
        &self.ordered
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }
}

impl Default for NativePluginRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_NATIVE_PLUGINS, DEFAULT_EXCLUDED_NATIVE_PLUGINS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = NativePluginRegistry::default();
        assert_eq!(registry.position("Oblivion.esm"), Some(0));
        assert_eq!(registry.position("Knights.esp"), Some(10));
        assert!(registry.is_excluded("AltarGymNavigation.esp"));
        assert!(!registry.is_native("AltarGymNavigation.esp"));
    }

    #[test]
    fn test_registry_deduplicates_and_lowercases() {
        let registry = NativePluginRegistry::new(["A.esm", "a.esm", "B.esp"], ["b.esp", "X.esp"]);
        assert_eq!(registry.ordered(), ["a.esm", "b.esp"]);
        // A file cannot be both ordered and excluded
        assert_eq!(registry.excluded(), ["x.esp"]);
    }
}
