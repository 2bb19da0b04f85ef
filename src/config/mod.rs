use crate::models::EngineConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::fs;

/// File name of the engine configuration inside the config directory
pub const CONFIG_FILE_NAME: &str = "pluginsync.yaml";

/// Prefix of environment variables that override the file
/// (`PLUGINSYNC_LOAD_ORDER__DEBOUNCE_MS=500`)
pub const ENV_PREFIX: &str = "PLUGINSYNC";

/// Configuration manager for loading and saving `pluginsync.yaml`.
///
/// Values are layered: built-in defaults, then the YAML file (optional), then
/// `PLUGINSYNC_*` environment variables. Saving writes the YAML file only.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating `config_dir` if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the engine configuration.
    ///
    /// A missing file yields the defaults (plus any environment overrides).
    pub fn load_config(&self) -> Result<EngineConfig> {
        self.load_with_env(None)
    }

    fn load_with_env(&self, env: Option<HashMap<String, String>>) -> Result<EngineConfig> {
        if !self.config_path.exists() {
            tracing::warn!("Config file not found at {}, using defaults", self.config_path);
        }

        let settings = Config::builder()
            .add_source(
                File::from(self.config_path.as_std_path())
                    .format(FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: EngineConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!("Loaded config from {}", self.config_path);
        Ok(config)
    }

    /// Save the engine configuration as YAML.
    pub fn save_config(&self, config: &EngineConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();
        let config = manager.load_with_env(Some(HashMap::new())).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_save_config() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut config = EngineConfig::default();
        config.load_order.debounce_ms = 250;
        config.load_order.data_mod_type = Some("data-folder".to_string());
        manager.save_config(&config).unwrap();

        let loaded = manager.load_with_env(Some(HashMap::new())).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_environment_overrides_file() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.config_path(), "load_order:\n  debounce_ms: 900\n").unwrap();

        let env = HashMap::from([
            ("PLUGINSYNC_LOAD_ORDER__DEBOUNCE_MS".to_string(), "300".to_string()),
            ("PLUGINSYNC_LOGGING__DEBUG".to_string(), "true".to_string()),
        ]);
        let config = manager.load_with_env(Some(env)).unwrap();

        assert_eq!(config.load_order.debounce_ms, 300);
        assert!(config.logging.debug);
        assert_eq!(config.load_order.plugins_file, "plugins.txt");
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.config_path(), "load_order: [unclosed").unwrap();
        assert!(manager.load_with_env(Some(HashMap::new())).is_err());
    }
}
