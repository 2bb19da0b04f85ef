//! Services module - load order business logic.
//!
//! Everything here is independent of any UI. The host is reached only through
//! the traits in [`collaborators`].
//!
//! # Components
//!
//! - [`plugin_list`]: parse and write `plugins.txt`
//! - [`scanner`]: list plugin files in the data directory
//! - [`reconciler`]: merge the persisted list, the directory and mod state into a [`LoadOrder`](crate::models::LoadOrder)
//! - [`native_order`]: detect and repair native plugins that are out of order or disabled
//! - [`validator`]: advisory check that every entry still has a file
//! - [`debouncer`]: coalesce bursts of edits into one check
//! - [`backup`]: keep `plugins.txt` across a purge/deploy cycle
//! - [`LoadOrderService`]: ties the above together
//!
//! # Usage Example
//!
//! ```ignore
//! use pluginsync::services::{Collaborators, LoadOrderService};
//!
//! let service = LoadOrderService::new(collaborators, config, StateManager::new(), metrics);
//!
//! let order = service.deserialize().await?;
//! let written = service.serialize(&edited, Some(&order)).await?;
//! ```

pub mod backup;
pub mod collaborators;
pub mod debouncer;
pub mod error;
pub mod load_order;
pub mod native_order;
pub mod plugin_list;
pub mod reconciler;
pub mod scanner;
pub mod validator;

pub use collaborators::{
    DiscoveryService, FixId, FixedDiscovery, GameStore, ModDirectoryIndex, NotificationSink,
    StaticModIndex, TracingNotificationSink, UnmanagedModIndex,
};
pub use debouncer::Debouncer;
pub use error::LoadOrderError;
pub use load_order::{Collaborators, LoadOrderService};
pub use validator::{InvalidEntry, ValidationResult, Validator};
