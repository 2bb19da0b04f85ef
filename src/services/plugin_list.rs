//! Reading and writing the persisted `plugins.txt`.
//!
//! ```text
//! # This file was automatically generated. Do not edit this file.
//! pluginA.esm
//! #pluginB.esp
//! pluginC.esp
//! ```
//!
//! A leading `#` directly followed by a file name marks a disabled plugin; `#`
//! followed by whitespace (or nothing) is a comment such as the header.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

use super::error::LoadOrderError;
use crate::models::{LoadOrder, PluginListEntry, plugin_id};

/// First line of every file we write
pub const PLUGINS_FILE_HEADER: &str =
    "# This file was automatically generated. Do not edit this file.";

const DISABLED_MARKER: char = '#';
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Parse `plugins.txt` content into its entries.
///
/// Duplicates (compared case-insensitively) keep their first occurrence.
pub fn parse(raw: &str) -> Vec<PluginListEntry> {
    let raw = raw.strip_prefix(BYTE_ORDER_MARK).unwrap_or(raw);
    let mut entries: IndexMap<String, PluginListEntry> = IndexMap::new();

    for line in raw.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let entry = match line.strip_prefix(DISABLED_MARKER) {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => continue,
            Some(rest) => PluginListEntry::new(rest, false),
            None => PluginListEntry::new(line, true),
        };

        entries.entry(entry.id()).or_insert(entry);
    }

    entries.into_values().collect()
}

/// Render a load order as `plugins.txt` content.
///
/// Invalid and disabled entries are written with the disable marker; entries
/// without a name are skipped.
pub fn serialize(order: &LoadOrder) -> String {
    let mut lines = Vec::with_capacity(order.len() + 1);
    lines.push(PLUGINS_FILE_HEADER.to_string());

    for entry in order {
        if entry.name.is_empty() {
            continue;
        }
        if entry.invalid || !entry.enabled {
            lines.push(format!("{DISABLED_MARKER}{}", entry.name));
        } else {
            lines.push(entry.name.clone());
        }
    }

    lines.join("\n")
}

/// Read and parse the plugin list.
///
/// A missing or unreadable file means "no prior order" and yields an empty list.
pub async fn read_plugins_file(path: &Utf8Path) -> Vec<PluginListEntry> {
    match tokio::fs::read(path).await {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(content) => {
                let entries = parse(&content);
                tracing::debug!("Read {} entries from {}", entries.len(), path);
                entries
            }
            Err(e) => {
                tracing::warn!("Plugin list {} is not valid UTF-8, ignoring it: {}", path, e);
                Vec::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No plugin list at {}", path);
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Failed to read plugin list {}, treating it as empty: {}", path, e);
            Vec::new()
        }
    }
}

/// Write the load order to `path`, replacing the whole file.
///
/// Content goes to a sibling temporary file first and is renamed over the
/// target, so readers never observe a partially written list.
pub async fn write_plugins_file(path: &Utf8Path, order: &LoadOrder) -> Result<(), LoadOrderError> {
    write_raw(path, &serialize(order)).await?;
    tracing::info!("Wrote {} plugins to {}", order.len(), path);
    Ok(())
}

pub(crate) async fn write_raw(path: &Utf8Path, content: &str) -> Result<(), LoadOrderError> {
    let temp_path = temp_path_for(path);
    let write_error = |source| LoadOrderError::Write {
        path: path.to_path_buf(),
        source,
    };

    tokio::fs::write(&temp_path, content)
        .await
        .map_err(write_error)?;

    if let Err(source) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(write_error(source));
    }

    Ok(())
}

fn temp_path_for(path: &Utf8Path) -> Utf8PathBuf {
    let file_name = path.file_name().unwrap_or("plugins.txt");
    path.with_file_name(format!(".{file_name}.tmp"))
}

/// Whether `name` carries one of the plugin extensions (case-insensitive)
pub fn is_plugin_file<S: AsRef<str>>(name: &str, extensions: &[S]) -> bool {
    let Some(extension) = Utf8Path::new(name).extension() else {
        return false;
    };
    extensions.iter().any(|allowed| {
        allowed
            .as_ref()
            .trim_start_matches('.')
            .eq_ignore_ascii_case(extension)
    })
}

/// Ids of the entries in `list`, in order
pub fn list_ids(list: &[PluginListEntry]) -> Vec<String> {
    list.iter().map(|entry| plugin_id(&entry.name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PluginEntry;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn names(list: &[PluginListEntry]) -> Vec<(&str, bool)> {
        list.iter().map(|e| (e.name.as_str(), e.enabled)).collect()
    }

    #[test]
    fn test_parse_skips_header_and_blank_lines() {
        let raw = format!("{PLUGINS_FILE_HEADER}\npluginA.esm\n\n#pluginB.esp\npluginC.esp\n");
        let list = parse(&raw);
        assert_eq!(
            names(&list),
            vec![("pluginA.esm", true), ("pluginB.esp", false), ("pluginC.esp", true)]
        );
    }

    #[test]
    fn test_parse_strips_bom_and_carriage_returns() {
        let list = parse("\u{feff}# header\r\nOblivion.esm\r\n#Knights.esp\r\n");
        assert_eq!(names(&list), vec![("Oblivion.esm", true), ("Knights.esp", false)]);
    }

    #[test]
    fn test_parse_keeps_first_occurrence() {
        let list = parse("b.esp\na.esm\n#B.ESP\nA.esm\nc.esp");
        assert_eq!(names(&list), vec![("b.esp", true), ("a.esm", true), ("c.esp", true)]);
    }

    #[test]
    fn test_parse_lone_marker_is_comment() {
        assert!(parse("#\n#   \n# comment").is_empty());
    }

    #[test]
    fn test_serialize_marks_disabled_and_invalid() {
        let order: LoadOrder = vec![
            PluginEntry::new("pluginA.esm", true),
            PluginEntry::new("pluginB.esp", false),
            PluginEntry::new("ghost.esp", true).into_invalid(),
            PluginEntry::new("", true),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            serialize(&order),
            format!("{PLUGINS_FILE_HEADER}\npluginA.esm\n#pluginB.esp\n#ghost.esp")
        );
    }

    #[test]
    fn test_is_plugin_file() {
        let extensions = [".esp", ".esm"];
        assert!(is_plugin_file("Knights.ESP", &extensions[..]));
        assert!(is_plugin_file("oblivion.esm", &extensions[..]));
        assert!(!is_plugin_file("textures.bsa", &extensions[..]));
        assert!(!is_plugin_file("esp", &extensions[..]));
    }

    #[tokio::test]
    async fn test_read_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("plugins.txt")).unwrap();
        assert!(read_plugins_file(&path).await.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("plugins.txt")).unwrap();
        let order: LoadOrder = vec![
            PluginEntry::new("Oblivion.esm", true),
            PluginEntry::new("Mod.esp", false),
        ]
        .into_iter()
        .collect();

        write_plugins_file(&path, &order).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(PLUGINS_FILE_HEADER));
        assert_eq!(
            names(&read_plugins_file(&path).await),
            vec![("Oblivion.esm", true), ("Mod.esp", false)]
        );
        // No temporary file left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("missing").join("plugins.txt")).unwrap();
        let result = write_plugins_file(&path, &LoadOrder::new()).await;
        assert!(matches!(result, Err(LoadOrderError::Write { .. })));
    }

    fn plugin_name() -> impl Strategy<Value = String> {
        ("[A-Za-z][A-Za-z0-9_]{0,7}", prop_oneof![Just("esp"), Just("esm"), Just("ESP")])
            .prop_map(|(stem, ext)| format!("{stem}.{ext}"))
    }

    proptest! {
        #[test]
        fn prop_serialize_is_idempotent(
            entries in prop::collection::vec((plugin_name(), any::<bool>()), 0..20)
        ) {
            let order: LoadOrder = entries
                .into_iter()
                .map(|(name, enabled)| PluginEntry::new(name, enabled))
                .collect();
            let first = serialize(&order);
            let reparsed = LoadOrder::from(parse(&first).as_slice());
            prop_assert_eq!(serialize(&reparsed), first);
        }

        #[test]
        fn prop_parse_yields_each_id_once_at_first_position(
            lines in prop::collection::vec((plugin_name(), any::<bool>()), 0..30)
        ) {
            let raw: Vec<String> = lines
                .iter()
                .map(|(name, enabled)| if *enabled { name.clone() } else { format!("#{name}") })
                .collect();
            let parsed = parse(&raw.join("\n"));

            let mut expected: Vec<String> = Vec::new();
            for (name, _) in &lines {
                let id = name.to_lowercase();
                if !expected.contains(&id) {
                    expected.push(id);
                }
            }
            prop_assert_eq!(list_ids(&parsed), expected);
        }
    }
}
