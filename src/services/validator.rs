use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::models::LoadOrder;

pub const REASON_FILE_NOT_FOUND: &str = "File not found";

/// A load order entry whose backing file is gone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidEntry {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub invalid: Vec<InvalidEntry>,
}

/// Checks that every entry of a load order still maps to a file.
///
/// Validation is advisory: findings are reported, never removed. After a
/// trusted internal write, [`suppress_next`](Self::suppress_next) skips exactly
/// one validation so entries that were just fixed are not flagged again.
#[derive(Debug, Default)]
pub struct Validator {
    skip_next: AtomicBool,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the next call to [`validate`](Self::validate)
    pub fn suppress_next(&self) {
        self.skip_next.store(true, Ordering::SeqCst);
    }

    pub fn is_suppressed(&self) -> bool {
        self.skip_next.load(Ordering::SeqCst)
    }

    pub async fn validate(&self, data_dir: &Utf8Path, order: &LoadOrder) -> Option<ValidationResult> {
        if self.skip_next.swap(false, Ordering::SeqCst) {
            tracing::debug!("Skipping validation after trusted load order update");
            return None;
        }
        if order.is_empty() {
            return None;
        }

        let mut invalid = Vec::new();
        for entry in order {
            let path = data_dir.join(&entry.name);
            if let Err(e) = tokio::fs::metadata(&path).await {
                tracing::debug!("Validation: {} not accessible: {}", path, e);
                invalid.push(InvalidEntry {
                    id: entry.id.clone(),
                    reason: REASON_FILE_NOT_FOUND.to_string(),
                });
            }
        }

        if invalid.is_empty() {
            None
        } else {
            tracing::warn!("Validation found {} invalid load order entries", invalid.len());
            Some(ValidationResult { invalid })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PluginEntry;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn setup(files: &[&str]) -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        for file in files {
            std::fs::write(dir.join(file), b"").unwrap();
        }
        (temp_dir, dir)
    }

    fn order_of(names: &[&str]) -> LoadOrder {
        names.iter().map(|name| PluginEntry::new(*name, true)).collect()
    }

    #[tokio::test]
    async fn test_missing_file_reported() {
        let (_guard, dir) = setup(&["a.esm"]);
        let result = Validator::new()
            .validate(&dir, &order_of(&["a.esm", "ghost.esp"]))
            .await
            .unwrap();

        assert_eq!(
            result.invalid,
            vec![InvalidEntry {
                id: "ghost.esp".to_string(),
                reason: "File not found".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_all_present_and_empty_are_none() {
        let (_guard, dir) = setup(&["a.esm"]);
        let validator = Validator::new();
        assert!(validator.validate(&dir, &order_of(&["a.esm"])).await.is_none());
        assert!(validator.validate(&dir, &LoadOrder::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_suppression_is_one_shot() {
        let (_guard, dir) = setup(&[]);
        let order = order_of(&["ghost.esp"]);
        let validator = Validator::new();

        validator.suppress_next();
        assert!(validator.is_suppressed());
        assert!(validator.validate(&dir, &order).await.is_none());
        assert!(!validator.is_suppressed());
        assert!(validator.validate(&dir, &order).await.is_some());
    }
}
