use serde::{Deserialize, Serialize};

use super::native::{
    DEFAULT_EXCLUDED_NATIVE_PLUGINS, DEFAULT_NATIVE_PLUGINS, NativePluginRegistry,
};

/// Engine configuration from `pluginsync.yaml`
///
/// Every section falls back to its defaults when omitted, so an empty file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub load_order: LoadOrderSettings,
    pub native_plugins: NativePluginSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOrderSettings {
    /// Data directory relative to the game root
    pub data_path: String,

    /// File name of the persisted plugin list inside the data directory
    pub plugins_file: String,

    /// Recognized plugin extensions, with the leading dot
    pub plugin_extensions: Vec<String>,

    /// Quiet window for coalescing load order change checks
    pub debounce_ms: u64,

    /// Replace an alphabetical order with the previous one on save
    pub guard_alphabetical_sort: bool,

    /// Shortest order the alphabetical guard will consider
    pub alphabetical_min_entries: usize,

    /// Mod type passed to the mod index when listing enabled mod files
    pub data_mod_type: Option<String>,

    /// Where plugin list backups are kept across purge/deploy
    pub backup_dir: String,
}

impl Default for LoadOrderSettings {
    fn default() -> Self {
        Self {
            data_path: "OblivionRemastered/Content/Dev/ObvData/Data".to_string(),
            plugins_file: "plugins.txt".to_string(),
            plugin_extensions: vec![".esp".to_string(), ".esm".to_string()],
            debounce_ms: 1200,
            guard_alphabetical_sort: true,
            alphabetical_min_entries: 3,
            data_mod_type: None,
            backup_dir: "backups".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativePluginSettings {
    pub ordered: Vec<String>,
    pub excluded: Vec<String>,
}

impl Default for NativePluginSettings {
    fn default() -> Self {
        Self {
            ordered: DEFAULT_NATIVE_PLUGINS.iter().map(|s| s.to_string()).collect(),
            excluded: DEFAULT_EXCLUDED_NATIVE_PLUGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl NativePluginSettings {
    pub fn registry(&self) -> NativePluginRegistry {
        NativePluginRegistry::new(&self.ordered, &self.excluded)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub directory: String,
    pub prefix: String,
    pub debug: bool,
    pub console: bool,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            prefix: "pluginsync".to_string(),
            debug: false,
            console: true,
            json: false,
        }
    }
}
