use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that escape the load order engine.
///
/// Per-entry problems (a missing plugin file, an unreadable `plugins.txt`) are
/// absorbed into the data model and never show up here.
#[derive(Error, Debug)]
pub enum LoadOrderError {
    #[error("Game data directory could not be resolved")]
    MissingDiscovery,

    #[error("Failed to read data directory {path}: {source}")]
    Scan {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write plugin list {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Profile name {0:?} cannot be used as a backup directory")]
    InvalidProfile(String),

    #[error("Failed to back up or restore plugin list {path}: {source}")]
    Backup {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
