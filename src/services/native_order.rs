//! Detection and repair of a corrupted native plugin order.
//!
//! Natives must keep the registry's relative order and must never be disabled.
//! Nothing here runs on its own: every repair is applied on explicit request.

use crate::models::{LoadOrder, NativePluginRegistry, PluginEntry};

/// Whether any two native entries appear in the wrong relative order
pub fn is_jumbled(order: &LoadOrder, registry: &NativePluginRegistry) -> bool {
    let positions: Vec<usize> = order
        .iter()
        .filter_map(|entry| registry.position(&entry.id))
        .collect();
    positions.windows(2).any(|pair| pair[0] > pair[1])
}

/// Move every native entry to its registry position and enable it.
///
/// Natives are taken out, sorted by registry position and re-inserted at that
/// position (or at the end when the list is shorter). Non-native entries keep
/// their relative order.
pub fn repair_native_order(order: &LoadOrder, registry: &NativePluginRegistry) -> LoadOrder {
    let (mut natives, mut rest): (Vec<PluginEntry>, Vec<PluginEntry>) = order
        .iter()
        .cloned()
        .partition(|entry| registry.is_native(&entry.id));

    natives.sort_by_key(|entry| registry.position(&entry.id));

    for mut native in natives {
        native.enabled = true;
        let target = registry
            .position(&native.id)
            .unwrap_or(usize::MAX)
            .min(rest.len());
        rest.insert(target, native);
    }

    tracing::info!("Repaired native plugin order ({} entries)", rest.len());
    rest.into_iter().collect()
}

/// Native entries that are currently disabled
pub fn disabled_natives<'a>(
    order: &'a LoadOrder,
    registry: &NativePluginRegistry,
) -> Vec<&'a PluginEntry> {
    order
        .iter()
        .filter(|entry| registry.is_native(&entry.id) && !entry.enabled)
        .collect()
}

/// Force-enable native entries without touching the order
pub fn enable_natives(order: &LoadOrder, registry: &NativePluginRegistry) -> LoadOrder {
    order
        .iter()
        .cloned()
        .map(|mut entry| {
            if registry.is_native(&entry.id) {
                entry.enabled = true;
            }
            entry
        })
        .collect()
}

/// Excluded natives the user has enabled
pub fn enabled_excluded<'a>(
    order: &'a LoadOrder,
    registry: &NativePluginRegistry,
) -> Vec<&'a PluginEntry> {
    order
        .iter()
        .filter(|entry| registry.is_excluded(&entry.id) && entry.is_effectively_enabled())
        .collect()
}

/// Disable every excluded native without touching the order
pub fn disable_excluded(order: &LoadOrder, registry: &NativePluginRegistry) -> LoadOrder {
    order
        .iter()
        .cloned()
        .map(|mut entry| {
            if registry.is_excluded(&entry.id) {
                entry.enabled = false;
            }
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn registry() -> NativePluginRegistry {
        NativePluginRegistry::new(["a.esm", "b.esp", "c.esp"], ["x.esp"])
    }

    fn order_of(names: &[&str]) -> LoadOrder {
        names.iter().map(|name| PluginEntry::new(*name, true)).collect()
    }

    #[test]
    fn test_jumbled_natives_repaired() {
        let order = order_of(&["b.esp", "a.esm", "c.esp", "d.esp"]);
        assert!(is_jumbled(&order, &registry()));

        let repaired = repair_native_order(&order, &registry());
        assert_eq!(repaired.ids(), vec!["a.esm", "b.esp", "c.esp", "d.esp"]);
        assert!(!is_jumbled(&repaired, &registry()));
    }

    #[test]
    fn test_interleaved_natives_in_order_are_not_jumbled() {
        let order = order_of(&["a.esm", "mod.esp", "c.esp"]);
        assert!(!is_jumbled(&order, &registry()));
        assert!(!is_jumbled(&order_of(&["mod.esp"]), &registry()));
    }

    #[test]
    fn test_repair_enables_natives() {
        let mut order = order_of(&["c.esp", "a.esm"]);
        order.entries_mut()[0].enabled = false;

        let repaired = repair_native_order(&order, &registry());
        assert_eq!(repaired.ids(), vec!["a.esm", "c.esp"]);
        assert!(repaired.iter().all(|entry| entry.enabled));
    }

    #[test]
    fn test_disabled_natives_and_enable() {
        let mut order = order_of(&["a.esm", "b.esp", "mod.esp"]);
        order.entries_mut()[1].enabled = false;
        order.entries_mut()[2].enabled = false;

        let disabled: Vec<&str> = disabled_natives(&order, &registry())
            .iter()
            .map(|entry| entry.id.as_str())
            .collect();
        assert_eq!(disabled, vec!["b.esp"]);

        let enabled = enable_natives(&order, &registry());
        assert_eq!(enabled.ids(), order.ids());
        assert!(enabled.get("b.esp").unwrap().enabled);
        assert!(!enabled.get("mod.esp").unwrap().enabled);
    }

    #[test]
    fn test_excluded_natives() {
        let order = order_of(&["a.esm", "x.esp"]);
        assert_eq!(enabled_excluded(&order, &registry()).len(), 1);

        let fixed = disable_excluded(&order, &registry());
        assert!(enabled_excluded(&fixed, &registry()).is_empty());
        assert!(fixed.get("a.esm").unwrap().enabled);
    }

    proptest! {
        #[test]
        fn prop_repair_restores_canonical_natives(
            mods in prop::collection::vec("[d-w][a-z]{0,4}", 0..8),
            natives in prop::sample::subsequence(vec!["a.esm", "b.esp", "c.esp"], 0..=3),
            seed in prop::collection::vec(any::<prop::sample::Index>(), 0..12),
        ) {
            let mut names: Vec<String> = mods.iter().map(|m| format!("{m}.esp")).collect();
            names.dedup();
            let expected_mods: Vec<String> = {
                let order: LoadOrder = names.iter().map(|n| PluginEntry::new(n.clone(), true)).collect();
                order.ids().into_iter().map(str::to_string).collect()
            };

            // Scatter the natives (reversed) through the mod list
            for (i, native) in natives.iter().rev().enumerate() {
                let at = seed.get(i).map(|ix| ix.index(names.len() + 1)).unwrap_or(0);
                names.insert(at, native.to_string());
            }
            let order: LoadOrder = names.iter().map(|n| PluginEntry::new(n.clone(), false)).collect();

            let repaired = repair_native_order(&order, &registry());
            let native_ids: Vec<&str> = repaired
                .iter()
                .filter(|e| registry().is_native(&e.id))
                .map(|e| e.id.as_str())
                .collect();
            prop_assert_eq!(native_ids, natives.clone());

            let mod_ids: Vec<String> = repaired
                .iter()
                .filter(|e| !registry().is_native(&e.id))
                .map(|e| e.id.clone())
                .collect();
            prop_assert_eq!(mod_ids, expected_mods);
            prop_assert!(repaired.iter().filter(|e| registry().is_native(&e.id)).all(|e| e.enabled));
        }
    }
}
