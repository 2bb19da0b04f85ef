use camino::Utf8Path;

use super::error::LoadOrderError;
use super::plugin_list::is_plugin_file;

/// List the plugin files physically present in the data directory.
///
/// The walk is non-recursive and returns file names with their on-disk casing,
/// in enumeration order. Hidden files and symlinks are skipped.
///
/// Mods are installed and removed concurrently by the host, so a directory that
/// is missing (or vanishes mid-walk) yields whatever was gathered instead of an
/// error.
pub async fn scan_data_directory<S: AsRef<str>>(
    data_dir: &Utf8Path,
    extensions: &[S],
) -> Result<Vec<String>, LoadOrderError> {
    let mut read_dir = match tokio::fs::read_dir(data_dir).await {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Data directory {} does not exist", data_dir);
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(LoadOrderError::Scan {
                path: data_dir.to_path_buf(),
                source,
            });
        }
    };

    let mut plugins = Vec::new();
    loop {
        let entry = match read_dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(
                    "Stopped scanning {} after {} plugins: {}",
                    data_dir,
                    plugins.len(),
                    e
                );
                break;
            }
        };

        let Ok(file_name) = entry.file_name().into_string() else {
            tracing::debug!("Skipping non UTF-8 file name in {}", data_dir);
            continue;
        };
        if file_name.starts_with('.') || !is_plugin_file(&file_name, extensions) {
            continue;
        }

        match entry.file_type().await {
            Ok(file_type) if file_type.is_file() => plugins.push(file_name),
            Ok(_) => {}
            Err(e) => tracing::debug!("Skipping {} (vanished during scan): {}", file_name, e),
        }
    }

    tracing::debug!("Found {} plugins in {}", plugins.len(), data_dir);
    Ok(plugins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::TempDir;

    const EXTENSIONS: [&str; 2] = [".esp", ".esm"];

    fn data_dir() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, path)
    }

    #[tokio::test]
    async fn test_scan_filters_by_extension() {
        let (_guard, dir) = data_dir();
        for name in ["Oblivion.esm", "Knights.ESP", "Textures.bsa", "readme.txt", ".hidden.esp"] {
            fs::write(dir.join(name), b"").unwrap();
        }
        fs::create_dir(dir.join("folder.esp")).unwrap();

        let mut found = scan_data_directory(&dir, &EXTENSIONS[..]).await.unwrap();
        found.sort();
        assert_eq!(found, vec!["Knights.ESP", "Oblivion.esm"]);
    }

    #[tokio::test]
    async fn test_scan_is_not_recursive() {
        let (_guard, dir) = data_dir();
        fs::create_dir(dir.join("nested")).unwrap();
        fs::write(dir.join("nested").join("deep.esp"), b"").unwrap();

        assert!(scan_data_directory(&dir, &EXTENSIONS[..]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_missing_directory_is_empty() {
        let (_guard, dir) = data_dir();
        let missing = dir.join("does-not-exist");
        assert!(scan_data_directory(&missing, &EXTENSIONS[..]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_file_instead_of_directory_is_error() {
        let (_guard, dir) = data_dir();
        let file = dir.join("plugins.txt");
        fs::write(&file, b"").unwrap();

        let result = scan_data_directory(&file, &EXTENSIONS[..]).await;
        assert!(matches!(result, Err(LoadOrderError::Scan { .. })));
    }
}
