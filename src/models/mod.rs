//! Data models for the load order engine.
//!
//! - [`PluginEntry`] / [`LoadOrder`]: the reconciled, ordered view of the game's plugins
//! - [`PluginListEntry`]: one line of the persisted `plugins.txt`
//! - [`NativePluginRegistry`]: the built-in plugins and their fixed relative order
//! - [`EngineConfig`]: settings loaded from `pluginsync.yaml`
//! - [`EngineState`]: runtime state held by the state manager
//!
//! A [`LoadOrder`] is a value: every deserialize builds a fresh one, and nothing
//! shares a mutable load order between tasks.

pub mod config;
pub mod engine_state;
pub mod native;
pub mod plugin;

pub use config::{EngineConfig, LoadOrderSettings, LoggingSettings, NativePluginSettings};
pub use engine_state::EngineState;
pub use native::NativePluginRegistry;
pub use plugin::{LoadOrder, PluginEntry, PluginListEntry, plugin_id};
