//! Seams between the engine and its host.
//!
//! The engine never reaches into global host state: the mod manager, game
//! discovery and user notifications are passed in as these traits.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::validator::InvalidEntry;

/// Mods known to the mod manager and the files they deploy.
pub trait ModDirectoryIndex: Send + Sync {
    /// Id of the mod that ships `file_name`, if any
    fn find_owning_mod(&self, file_name: &str) -> Option<String>;

    fn is_mod_enabled(&self, mod_id: &str) -> bool;

    /// File names deployed by enabled mods, optionally restricted to one mod type
    fn list_enabled_mod_files(&self, mod_type: Option<&str>) -> HashSet<String>;
}

/// Store the game was installed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStore {
    Steam,
    Xbox,
    Other,
}

/// Where the game lives.
#[cfg_attr(test, mockall::automock)]
pub trait DiscoveryService: Send + Sync {
    /// Absolute data directory, or `None` while the game has not been located
    fn resolve_data_directory(&self) -> Option<Utf8PathBuf>;

    fn store(&self) -> Option<GameStore>;
}

/// Repairs a notification may offer. The host maps these back to
/// [`LoadOrderService::apply_fix`](super::LoadOrderService::apply_fix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixId {
    RepairNativeOrder,
    EnableNativePlugins,
    DisableExcludedPlugins,
    RemoveInvalidEntries,
    ResetPluginsFile,
}

/// Receives user-facing findings.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    fn report_invalid_entries(&self, entries: Vec<InvalidEntry>, fixes: Vec<FixId>);

    fn report_native_order_jumbled(&self, fix: FixId);

    fn report_native_plugins_disabled(&self, fix: FixId);

    fn report_excluded_plugins_enabled(&self, plugins: Vec<String>, fix: FixId);

    fn report_write_failure(&self, message: String);
}

/// Discovery with a fixed game root, as used by the command line.
#[derive(Debug, Clone)]
pub struct FixedDiscovery {
    data_dir: Utf8PathBuf,
    store: GameStore,
}

impl FixedDiscovery {
    pub fn new(game_root: &Utf8Path, data_path: &str, store: GameStore) -> Self {
        Self {
            data_dir: game_root.join(data_path),
            store,
        }
    }
}

impl DiscoveryService for FixedDiscovery {
    fn resolve_data_directory(&self) -> Option<Utf8PathBuf> {
        Some(self.data_dir.clone())
    }

    fn store(&self) -> Option<GameStore> {
        Some(self.store)
    }
}

/// A game with no mod manager in front of it: nothing is tracked.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnmanagedModIndex;

impl ModDirectoryIndex for UnmanagedModIndex {
    fn find_owning_mod(&self, _file_name: &str) -> Option<String> {
        None
    }

    fn is_mod_enabled(&self, _mod_id: &str) -> bool {
        false
    }

    fn list_enabled_mod_files(&self, _mod_type: Option<&str>) -> HashSet<String> {
        HashSet::new()
    }
}

#[derive(Debug, Clone)]
struct IndexedMod {
    enabled: bool,
    mod_type: Option<String>,
    files: Vec<String>,
}

/// In-memory mod index, keyed by mod id.
#[derive(Debug, Clone, Default)]
pub struct StaticModIndex {
    mods: HashMap<String, IndexedMod>,
}

impl StaticModIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mod<I, S>(mut self, mod_id: &str, enabled: bool, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(mod_id, enabled, None, files);
        self
    }

    pub fn insert<I, S>(&mut self, mod_id: &str, enabled: bool, mod_type: Option<&str>, files: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mods.insert(
            mod_id.to_string(),
            IndexedMod {
                enabled,
                mod_type: mod_type.map(str::to_string),
                files: files.into_iter().map(Into::into).collect(),
            },
        );
    }
}

impl ModDirectoryIndex for StaticModIndex {
    fn find_owning_mod(&self, file_name: &str) -> Option<String> {
        // Prefer an enabled owner when several mods ship the same file
        let mut owners: Vec<(&String, &IndexedMod)> = self
            .mods
            .iter()
            .filter(|(_, indexed)| {
                indexed
                    .files
                    .iter()
                    .any(|file| file.eq_ignore_ascii_case(file_name))
            })
            .collect();
        owners.sort_by(|a, b| b.1.enabled.cmp(&a.1.enabled).then_with(|| a.0.cmp(b.0)));
        owners.first().map(|(mod_id, _)| (*mod_id).clone())
    }

    fn is_mod_enabled(&self, mod_id: &str) -> bool {
        self.mods.get(mod_id).is_some_and(|indexed| indexed.enabled)
    }

    fn list_enabled_mod_files(&self, mod_type: Option<&str>) -> HashSet<String> {
        self.mods
            .values()
            .filter(|indexed| indexed.enabled)
            .filter(|indexed| mod_type.is_none() || indexed.mod_type.as_deref() == mod_type)
            .flat_map(|indexed| indexed.files.iter().cloned())
            .collect()
    }
}

/// Sends every finding to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn report_invalid_entries(&self, entries: Vec<InvalidEntry>, fixes: Vec<FixId>) {
        for entry in &entries {
            tracing::warn!("Invalid load order entry {}: {}", entry.id, entry.reason);
        }
        tracing::warn!("{} invalid entries, available fixes: {:?}", entries.len(), fixes);
    }

    fn report_native_order_jumbled(&self, fix: FixId) {
        tracing::warn!("Native plugins are in an incorrect order (fix: {:?})", fix);
    }

    fn report_native_plugins_disabled(&self, fix: FixId) {
        tracing::warn!("Native plugins are disabled (fix: {:?})", fix);
    }

    fn report_excluded_plugins_enabled(&self, plugins: Vec<String>, fix: FixId) {
        tracing::warn!(
            "Excluded plugins are enabled: {} (fix: {:?})",
            plugins.join(", "),
            fix
        );
    }

    fn report_write_failure(&self, message: String) {
        tracing::error!("Failed to save load order: {}", message);
    }
}
