// State management module
//
// This module provides the StateManager which wraps EngineState with thread-safe access
// using Arc<RwLock<T>> and emits change events for hosts that track the load order.

use crate::models::{EngineState, LoadOrder};
use camino::Utf8PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// Hosts subscribe to these instead of polling the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The data directory was resolved (or lost)
    DataDirectoryChanged {
        data_dir: Option<Utf8PathBuf>,
    },

    /// A purge/deploy cycle has started
    DeploymentStarted,

    /// The purge/deploy cycle has finished
    DeploymentFinished,

    /// A fresh load order was reconciled
    LoadOrderLoaded {
        total: usize,
        enabled: usize,
        invalid: usize,
    },

    /// The load order was written to `plugins.txt`
    LoadOrderSaved {
        total: usize,
        enabled: usize,
    },

    /// The set of entries flagged by validation changed
    ValidationChanged {
        invalid: Vec<String>,
    },

    /// State has been reset
    StateReset,
}

/// Thread-safe state manager with event emission
///
/// - Provides thread-safe access to [`EngineState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// Use [`read()`](Self::read) for reads, [`update()`](Self::update) for
/// mutations and [`subscribe()`](Self::subscribe) to listen for changes.
pub struct StateManager {
    state: Arc<RwLock<EngineState>>,

    /// Multiple subscribers can listen for state changes
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state and a 100 event buffer
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(EngineState::default())),
            state_tx,
        }
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> EngineState {
        self.read_guard().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let pending = state_manager.read(|state| state.deployment_pending);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&EngineState) -> R,
    {
        f(&self.read_guard())
    }

    /// Update the state and emit change events
    ///
    /// Captures the old state, applies `update_fn`, then broadcasts whatever
    /// [`detect_changes`](Self::detect_changes) finds. Returns the emitted events.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut EngineState),
    {
        let mut state = self.write_guard();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = self.detect_changes(&old_state, &state);
        for change in &changes {
            // No subscribers is fine
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(&self, old: &EngineState, new: &EngineState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.data_dir != new.data_dir {
            changes.push(StateChange::DataDirectoryChanged {
                data_dir: new.data_dir.clone(),
            });
        }

        if old.deployment_pending != new.deployment_pending {
            if new.deployment_pending {
                changes.push(StateChange::DeploymentStarted);
            } else {
                changes.push(StateChange::DeploymentFinished);
            }
        }

        let (total, enabled, invalid) = new.counts();
        if old.last_saved != new.last_saved {
            if new.last_saved.is_some() {
                changes.push(StateChange::LoadOrderSaved { total, enabled });
            }
        } else if old.current != new.current {
            changes.push(StateChange::LoadOrderLoaded {
                total,
                enabled,
                invalid,
            });
        }

        if old.invalid_ids != new.invalid_ids {
            changes.push(StateChange::ValidationChanged {
                invalid: new.invalid_ids.clone(),
            });
        }

        changes
    }

    // Convenience methods for common state updates

    pub fn set_data_dir(&self, data_dir: Option<Utf8PathBuf>) -> Vec<StateChange> {
        self.update(|state| state.data_dir = data_dir)
    }

    pub fn set_deployment_pending(&self, pending: bool) -> Vec<StateChange> {
        self.update(|state| state.deployment_pending = pending)
    }

    pub fn is_deployment_pending(&self) -> bool {
        self.read(|state| state.deployment_pending)
    }

    /// Record a freshly reconciled order
    pub fn record_loaded(&self, order: LoadOrder) -> Vec<StateChange> {
        self.update(|state| state.current = order)
    }

    /// Record an order the engine just wrote
    pub fn record_saved(&self, order: LoadOrder) -> Vec<StateChange> {
        self.update(|state| {
            state.current = order.clone();
            state.last_saved = Some(order);
        })
    }

    pub fn record_validation(&self, invalid_ids: Vec<String>) -> Vec<StateChange> {
        self.update(|state| state.invalid_ids = invalid_ids)
    }

    /// Order the alphabetical guard compares against
    pub fn reference_order(&self) -> Option<LoadOrder> {
        self.read(|state| state.reference_order().cloned())
    }

    /// Forget everything, e.g. when switching to another game
    pub fn reset(&self) -> Vec<StateChange> {
        let mut changes = self.update(EngineState::reset);

        let reset_event = StateChange::StateReset;
        let _ = self.state_tx.send(reset_event.clone());
        changes.push(reset_event);

        changes
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the same state and channel
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
