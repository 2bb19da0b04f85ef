// pluginsync - load order reconciliation for Gamebryo game plugins
//
// This is the library crate containing the engine. The binary crate (main.rs)
// provides a command line driver.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{EngineConfig, EngineState, LoadOrder, PluginEntry};
pub use services::{LoadOrderError, LoadOrderService};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
