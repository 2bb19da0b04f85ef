use camino::Utf8PathBuf;

use super::plugin::LoadOrder;

/// Runtime state of the load order engine
///
/// Owned by [`crate::state::StateManager`]; never persisted. The only durable
/// state is `plugins.txt` itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    /// Data directory resolved by the last deserialize, if any
    pub data_dir: Option<Utf8PathBuf>,

    /// A purge/deploy cycle is running; missing mod files are expected
    pub deployment_pending: bool,

    /// Most recently reconciled or saved order
    pub current: LoadOrder,

    /// Order last written to `plugins.txt` by the engine
    pub last_saved: Option<LoadOrder>,

    /// Entries flagged by the last validation pass
    pub invalid_ids: Vec<String>,
}

impl EngineState {
    /// (total, enabled, invalid) counts of the current order
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.current.len(),
            self.current.enabled_plugins().len(),
            self.current.invalid_entries().count(),
        )
    }

    /// Reference order for the alphabetical guard
    pub fn reference_order(&self) -> Option<&LoadOrder> {
        self.last_saved.as_ref().or(if self.current.is_empty() {
            None
        } else {
            Some(&self.current)
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PluginEntry;

    #[test]
    fn test_counts() {
        let mut state = EngineState::default();
        state.current = vec![
            PluginEntry::new("a.esm", true),
            PluginEntry::new("b.esp", false),
            PluginEntry::new("c.esp", true).into_invalid(),
        ]
        .into_iter()
        .collect();

        assert_eq!(state.counts(), (3, 1, 1));
    }

    #[test]
    fn test_reference_order_prefers_last_saved() {
        let mut state = EngineState::default();
        assert!(state.reference_order().is_none());

        state.current = vec![PluginEntry::new("a.esm", true)].into_iter().collect();
        assert_eq!(state.reference_order().unwrap().ids(), vec!["a.esm"]);

        state.last_saved = Some(vec![PluginEntry::new("b.esp", true)].into_iter().collect());
        assert_eq!(state.reference_order().unwrap().ids(), vec!["b.esp"]);

        state.reset();
        assert_eq!(state, EngineState::default());
    }
}
