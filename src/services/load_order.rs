use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use super::backup;
use super::collaborators::{DiscoveryService, FixId, GameStore, ModDirectoryIndex, NotificationSink};
use super::debouncer::Debouncer;
use super::error::LoadOrderError;
use super::native_order::{
    disable_excluded, disabled_natives, enable_natives, enabled_excluded, is_jumbled,
    repair_native_order,
};
use super::plugin_list::{read_plugins_file, write_plugins_file};
use super::reconciler::{ReconcileInput, guard_alphabetical, reconcile};
use super::scanner::scan_data_directory;
use super::validator::{ValidationResult, Validator};
use crate::metrics::Metrics;
use crate::models::{EngineConfig, LoadOrder, NativePluginRegistry, PluginEntry, plugin_id};
use crate::state::StateManager;

const CHECK_KEY: &str = "plugins";

/// The host services the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub discovery: Arc<dyn DiscoveryService>,
    pub mods: Arc<dyn ModDirectoryIndex>,
    pub notifications: Arc<dyn NotificationSink>,
}

/// Entry point for everything that reads or writes the load order.
///
/// Every [`deserialize`](Self::deserialize) rebuilds the order from disk; every
/// successful write schedules one debounced [`check`](Self::check) that reports
/// native order problems and missing files to the [`NotificationSink`]. Nothing
/// is repaired until the host calls [`apply_fix`](Self::apply_fix).
///
/// Constructed behind an `Arc` so the debounced check can reach back into the
/// service; must be created inside a tokio runtime.
pub struct LoadOrderService {
    discovery: Arc<dyn DiscoveryService>,
    mods: Arc<dyn ModDirectoryIndex>,
    notifications: Arc<dyn NotificationSink>,
    config: EngineConfig,
    registry: NativePluginRegistry,
    validator: Validator,
    state: StateManager,
    metrics: Arc<Metrics>,
    checks: Debouncer<&'static str, LoadOrder>,
}

impl LoadOrderService {
    pub fn new(
        collaborators: Collaborators,
        config: EngineConfig,
        state: StateManager,
        metrics: Arc<Metrics>,
    ) -> Arc<Self> {
        let delay = Duration::from_millis(config.load_order.debounce_ms);
        let registry = config.native_plugins.registry();

        Arc::new_cyclic(|service: &Weak<Self>| {
            let service = service.clone();
            let checks = Debouncer::new(delay, move |order: LoadOrder| {
                let service = service.clone();
                async move {
                    if let Some(service) = service.upgrade() {
                        service.check(&order).await;
                    }
                }
            });

            Self {
                discovery: collaborators.discovery,
                mods: collaborators.mods,
                notifications: collaborators.notifications,
                config,
                registry,
                validator: Validator::new(),
                state,
                metrics,
                checks,
            }
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &NativePluginRegistry {
        &self.registry
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Number of writes whose check has not run yet
    pub fn pending_checks(&self) -> usize {
        self.checks.pending()
    }

    /// Path of `plugins.txt`, if the game has been located
    pub fn plugins_file_path(&self) -> Option<Utf8PathBuf> {
        self.discovery
            .resolve_data_directory()
            .map(|data_dir| data_dir.join(&self.config.load_order.plugins_file))
    }

    fn require_data_dir(&self) -> Result<Utf8PathBuf, LoadOrderError> {
        self.discovery
            .resolve_data_directory()
            .ok_or(LoadOrderError::MissingDiscovery)
    }

    /// Build the current load order from `plugins.txt`, the data directory and
    /// the mod index.
    ///
    /// Returns an empty order while the game has not been located.
    pub async fn deserialize(&self) -> Result<LoadOrder> {
        let Some(data_dir) = self.discovery.resolve_data_directory() else {
            tracing::warn!("Game data directory not resolved, load order is empty");
            self.state.set_data_dir(None);
            return Ok(LoadOrder::new());
        };
        self.state.set_data_dir(Some(data_dir.clone()));

        let started = Instant::now();
        let settings = &self.config.load_order;

        let scanned = scan_data_directory(&data_dir, &settings.plugin_extensions)
            .await
            .with_context(|| format!("Failed to scan data directory {}", data_dir))?;
        let persisted = read_plugins_file(&data_dir.join(&settings.plugins_file)).await;

        let order = reconcile(&ReconcileInput {
            persisted: &persisted,
            scanned: &scanned,
            index: self.mods.as_ref(),
            registry: &self.registry,
            extensions: &settings.plugin_extensions,
            mod_type: settings.data_mod_type.as_deref(),
            deployment_pending: self.state.is_deployment_pending(),
        });

        let invalid = order.invalid_entries().count();
        self.metrics.record_reconciliation(started.elapsed(), invalid);
        tracing::info!(
            "Reconciled {} plugins ({} persisted, {} on disk, {} invalid)",
            order.len(),
            persisted.len(),
            scanned.len(),
            invalid
        );

        self.state.record_loaded(order.clone());
        Ok(order)
    }

    /// Persist an edited load order.
    ///
    /// When the order looks like it was reset to alphabetical order, it is put
    /// back in the order of `previous` (or of the last saved order) first. The
    /// order actually written is returned.
    pub async fn serialize(&self, order: &LoadOrder, previous: Option<&LoadOrder>) -> Result<LoadOrder> {
        let data_dir = self.require_data_dir()?;
        let settings = &self.config.load_order;

        let mut next = order.clone();
        if settings.guard_alphabetical_sort {
            let reference = previous.cloned().or_else(|| self.state.reference_order());
            if let Some(reference) = reference {
                if let Some(restored) =
                    guard_alphabetical(&next, &reference, settings.alphabetical_min_entries)
                {
                    self.metrics.record_alphabetical_restore();
                    next = restored;
                }
            }
        }

        self.persist(&data_dir, next, false).await
    }

    /// Write `order` and schedule its check. With `trusted`, the validation of
    /// that check is skipped once the write has landed.
    async fn persist(&self, data_dir: &Utf8Path, order: LoadOrder, trusted: bool) -> Result<LoadOrder> {
        let path = data_dir.join(&self.config.load_order.plugins_file);

        if let Err(e) = write_plugins_file(&path, &order).await {
            self.metrics.record_write_failure();
            self.notifications.report_write_failure(e.to_string());
            return Err(e).context("Failed to save load order");
        }

        if trusted {
            self.validator.suppress_next();
        }
        self.metrics.record_save();
        self.state.record_saved(order.clone());
        self.checks.schedule(CHECK_KEY, order.clone());
        Ok(order)
    }

    /// Check every entry of `order` against the data directory.
    ///
    /// Advisory only; `None` when nothing is missing, when the game has not
    /// been located, or right after a fix was written.
    pub async fn validate(&self, order: &LoadOrder) -> Option<ValidationResult> {
        let data_dir = self.discovery.resolve_data_directory()?;

        let suppressed = self.validator.is_suppressed();
        let result = self.validator.validate(&data_dir, order).await;
        self.metrics.record_validation(suppressed);

        if !suppressed {
            let invalid_ids = result
                .as_ref()
                .map(|result| result.invalid.iter().map(|entry| entry.id.clone()).collect())
                .unwrap_or_default();
            self.state.record_validation(invalid_ids);
        }
        result
    }

    /// Report everything wrong with `order` to the notification sink.
    ///
    /// Runs automatically after each write once edits settle.
    pub async fn check(&self, order: &LoadOrder) -> Option<ValidationResult> {
        self.metrics.record_check();
        tracing::debug!("Checking load order of {} plugins", order.len());

        if is_jumbled(order, &self.registry) {
            self.notifications
                .report_native_order_jumbled(FixId::RepairNativeOrder);
        }
        if !disabled_natives(order, &self.registry).is_empty() {
            self.notifications
                .report_native_plugins_disabled(FixId::EnableNativePlugins);
        }

        let excluded: Vec<String> = enabled_excluded(order, &self.registry)
            .into_iter()
            .map(|entry| entry.name.clone())
            .collect();
        if !excluded.is_empty() {
            self.notifications
                .report_excluded_plugins_enabled(excluded, FixId::DisableExcludedPlugins);
        }

        let result = self.validate(order).await;
        if let Some(result) = &result {
            self.notifications
                .report_invalid_entries(result.invalid.clone(), vec![FixId::RemoveInvalidEntries]);
        }
        result
    }

    /// Apply a repair offered by a notification and write the result.
    ///
    /// The next validation is skipped so the entries just fixed are not
    /// reported again.
    pub async fn apply_fix(&self, fix: FixId) -> Result<LoadOrder> {
        let data_dir = self.require_data_dir()?;

        let fixed = match fix {
            FixId::RepairNativeOrder => repair_native_order(&self.deserialize().await?, &self.registry),
            FixId::EnableNativePlugins => enable_natives(&self.deserialize().await?, &self.registry),
            FixId::DisableExcludedPlugins => {
                disable_excluded(&self.deserialize().await?, &self.registry)
            }
            FixId::RemoveInvalidEntries => {
                self.remove_invalid(&data_dir, &self.deserialize().await?).await
            }
            FixId::ResetPluginsFile => self.native_order_on_disk(&data_dir).await?,
        };

        tracing::info!("Applying fix {:?} ({} plugins)", fix, fixed.len());
        let written = self.persist(&data_dir, fixed, true).await?;
        self.metrics.record_fix();
        Ok(written)
    }

    /// Drop entries that are invalid right now.
    ///
    /// Ids flagged by an earlier validation only count while their file is
    /// still missing.
    async fn remove_invalid(&self, data_dir: &Utf8Path, order: &LoadOrder) -> LoadOrder {
        let flagged = self.state.read(|state| state.invalid_ids.clone());

        let mut kept = LoadOrder::new();
        for entry in order {
            if entry.invalid {
                continue;
            }
            if flagged.contains(&entry.id)
                && tokio::fs::metadata(data_dir.join(&entry.name)).await.is_err()
            {
                tracing::debug!("Removing {} flagged by the last validation", entry.name);
                continue;
            }
            kept.push(entry.clone());
        }
        kept
    }

    /// Replace `plugins.txt` with only the native plugins present on disk, in
    /// their canonical order.
    pub async fn reset_plugins_file(&self) -> Result<LoadOrder> {
        self.apply_fix(FixId::ResetPluginsFile).await
    }

    async fn native_order_on_disk(&self, data_dir: &Utf8Path) -> Result<LoadOrder> {
        let scanned = scan_data_directory(data_dir, &self.config.load_order.plugin_extensions)
            .await
            .with_context(|| format!("Failed to scan data directory {}", data_dir))?;

        let order: LoadOrder = self
            .registry
            .ordered()
            .iter()
            .filter_map(|native| scanned.iter().find(|name| plugin_id(name) == *native))
            .map(|name| PluginEntry::new(name.clone(), true))
            .collect();

        tracing::warn!("Resetting plugin list to {} native plugins", order.len());
        Ok(order)
    }

    /// Run the pending debounced check now instead of waiting for it.
    ///
    /// For callers that exit right after a write. Does nothing when no check
    /// is pending.
    pub async fn flush_pending_check(&self) -> Option<ValidationResult> {
        if !self.checks.cancel(&CHECK_KEY) {
            return None;
        }
        let order = self
            .state
            .read(|state| state.last_saved.clone())
            .unwrap_or_default();
        self.check(&order).await
    }

    /// Copy `plugins.txt` aside for `profile` before a purge.
    pub async fn backup_plugins_file(&self, profile: &str) -> Result<Option<Utf8PathBuf>> {
        let data_dir = self.require_data_dir()?;
        let path = data_dir.join(&self.config.load_order.plugins_file);
        let backup_dir = Utf8Path::new(&self.config.load_order.backup_dir);

        Ok(backup::backup_plugins_file(&path, backup_dir, profile).await?)
    }

    /// Put the `profile` backup back before a deployment.
    ///
    /// Only the Xbox store build loses the list during purge, so other stores
    /// are left alone. Returns whether a backup was restored.
    pub async fn restore_plugins_file(&self, profile: &str) -> Result<bool> {
        let data_dir = self.require_data_dir()?;
        if self.discovery.store() != Some(GameStore::Xbox) {
            tracing::debug!("Skipping plugin list restore outside the Xbox store build");
            return Ok(false);
        }

        let path = data_dir.join(&self.config.load_order.plugins_file);
        let backup_dir = Utf8Path::new(&self.config.load_order.backup_dir);
        Ok(backup::restore_plugins_file(&path, backup_dir, profile).await?)
    }

    /// Mark a purge/deploy cycle as running.
    ///
    /// Until [`end_deployment`](Self::end_deployment), files missing from an
    /// enabled mod are expected and stay valid.
    pub fn begin_deployment(&self) {
        tracing::debug!("Deployment started");
        self.state.set_deployment_pending(true);
    }

    pub fn end_deployment(&self) {
        tracing::debug!("Deployment finished");
        self.state.set_deployment_pending(false);
    }
}
