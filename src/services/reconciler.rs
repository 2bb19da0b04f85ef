//! Merging the persisted list, the data directory and mod manager state into
//! one authoritative load order.

use std::collections::HashMap;

use super::collaborators::ModDirectoryIndex;
use super::plugin_list::is_plugin_file;
use crate::models::{LoadOrder, NativePluginRegistry, PluginEntry, PluginListEntry, plugin_id};

/// Everything a reconciliation pass looks at.
pub struct ReconcileInput<'a, S: AsRef<str>> {
    /// Parsed `plugins.txt`, in file order
    pub persisted: &'a [PluginListEntry],

    /// Plugin files found in the data directory, in enumeration order
    pub scanned: &'a [String],

    pub index: &'a dyn ModDirectoryIndex,
    pub registry: &'a NativePluginRegistry,
    pub extensions: &'a [S],

    /// Mod type to restrict `list_enabled_mod_files` to
    pub mod_type: Option<&'a str>,

    /// A deployment is in flight, so files may legitimately be missing for now
    pub deployment_pending: bool,
}

/// Build the load order.
///
/// - Entries from `plugins.txt` keep their relative order exactly.
/// - Files on disk that the list does not mention are appended, enabled
///   (excluded natives are appended disabled).
/// - Entries whose enabled owning mod failed to deploy them are kept but marked
///   invalid, pinned and moved after every valid entry.
pub fn reconcile<S: AsRef<str>>(input: &ReconcileInput<'_, S>) -> LoadOrder {
    let on_disk: HashMap<String, &String> = input
        .scanned
        .iter()
        .map(|name| (plugin_id(name), name))
        .collect();

    let mut order = LoadOrder::new();
    let mut invalid = LoadOrder::new();

    for item in input.persisted {
        if !is_plugin_file(&item.name, input.extensions) {
            tracing::debug!("Ignoring non-plugin line in plugin list: {}", item.name);
            continue;
        }
        let id = item.id();
        if order.contains(&id) || invalid.contains(&id) {
            continue;
        }

        let in_data_folder = on_disk.contains_key(&id);
        let owner = input.index.find_owning_mod(&item.name);
        let owner_enabled = owner
            .as_deref()
            .map(|mod_id| input.index.is_mod_enabled(mod_id));

        // Prefer the on-disk casing for display
        let name = on_disk
            .get(&id)
            .map(|name| (*name).clone())
            .unwrap_or_else(|| item.name.clone());

        match (owner_enabled, in_data_folder) {
            (_, true) => {
                order.push(PluginEntry::new(name, item.enabled).with_owner(owner));
            }
            (Some(true), false) if input.deployment_pending => {
                tracing::debug!("{} not deployed yet, deployment pending", item.name);
                order.push(PluginEntry::new(name, item.enabled).with_owner(owner));
            }
            (Some(true), false) => {
                tracing::warn!(
                    "{} belongs to an enabled mod but is missing from the data directory",
                    item.name
                );
                invalid.push(PluginEntry::new(name, item.enabled).with_owner(owner).into_invalid());
            }
            (Some(false), false) => {
                tracing::debug!("Dropping {} (owning mod disabled, not on disk)", item.name);
            }
            (None, false) => {
                tracing::debug!("Dropping {} (untracked, not on disk)", item.name);
            }
        }
    }

    for name in input.scanned {
        let id = plugin_id(name);
        if order.contains(&id) || invalid.contains(&id) {
            continue;
        }
        let enabled = !input.registry.is_excluded(&id);
        let owner = input.index.find_owning_mod(name);
        tracing::debug!("Appending newly discovered plugin {} (enabled={})", name, enabled);
        order.push(PluginEntry::new(name.clone(), enabled).with_owner(owner));
    }

    if !input.deployment_pending {
        let mut expected: Vec<String> = input
            .index
            .list_enabled_mod_files(input.mod_type)
            .into_iter()
            .filter(|name| is_plugin_file(name, input.extensions))
            .collect();
        expected.sort();

        for name in expected {
            let id = plugin_id(&name);
            if order.contains(&id) || invalid.contains(&id) || on_disk.contains_key(&id) {
                continue;
            }
            tracing::warn!("{} is provided by an enabled mod but was never deployed", name);
            let owner = input.index.find_owning_mod(&name);
            invalid.push(PluginEntry::new(name, false).with_owner(owner).into_invalid());
        }
    }

    for entry in invalid {
        order.push(entry);
    }
    order
}

/// Stable sort of `entries` against a previously known order.
///
/// Invalid or locked entries go last; entries the reference does not know go
/// after the known ones; ties keep their current relative order.
pub fn sort_against_reference(entries: LoadOrder, reference: &LoadOrder) -> LoadOrder {
    let positions: HashMap<&str, usize> = reference
        .iter()
        .enumerate()
        .map(|(index, entry)| (entry.id.as_str(), index))
        .collect();

    let mut sorted = entries.into_entries();
    sorted.sort_by_key(|entry| {
        let pinned = entry.locked || entry.invalid;
        let position = positions.get(entry.id.as_str()).copied().unwrap_or(usize::MAX);
        (pinned, position)
    });
    sorted.into_iter().collect()
}

/// Whether the order looks like it was reset to alphabetical order.
///
/// Orders shorter than `min_entries` are never considered alphabetical.
pub fn is_alphabetical(order: &LoadOrder, min_entries: usize) -> bool {
    order.len() >= min_entries.max(2) && order.entries().windows(2).all(|pair| pair[0].id <= pair[1].id)
}

/// Undo a suspected reset of the load order to alphabetical order.
///
/// Returns `next` re-sorted against `previous` when `next` is alphabetical,
/// `previous` is not, and the two orders differ. Returns `None` when the guard
/// does not apply.
pub fn guard_alphabetical(
    next: &LoadOrder,
    previous: &LoadOrder,
    min_entries: usize,
) -> Option<LoadOrder> {
    if previous.is_empty() || !is_alphabetical(next, min_entries) {
        return None;
    }
    if is_alphabetical(previous, min_entries) || next.ids() == previous.ids() {
        return None;
    }

    tracing::warn!(
        "Load order of {} plugins was reset to alphabetical order, restoring previous order",
        next.len()
    );
    Some(sort_against_reference(next.clone(), previous))
}
