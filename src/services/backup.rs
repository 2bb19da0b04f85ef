//! Per-profile copies of `plugins.txt` kept across a purge/deploy cycle.
//!
//! Some hosts rewrite the plugin list while purging and fail to put it back on
//! deploy. The list is copied aside before the purge and copied back before the
//! next deployment.

use camino::{Utf8Path, Utf8PathBuf};

use super::error::LoadOrderError;
use super::plugin_list::write_raw;

/// Location of the backup for `plugins_file` under `backup_dir/<profile>/`
///
/// The profile must be a single path component.
pub fn backup_path(
    backup_dir: &Utf8Path,
    profile: &str,
    plugins_file: &Utf8Path,
) -> Result<Utf8PathBuf, LoadOrderError> {
    if profile.is_empty()
        || profile == "."
        || profile == ".."
        || profile.contains(['/', '\\'])
    {
        return Err(LoadOrderError::InvalidProfile(profile.to_string()));
    }
    let file_name = plugins_file.file_name().unwrap_or("plugins.txt");
    Ok(backup_dir.join(profile).join(file_name))
}

/// Copy `plugins_file` aside for `profile`, replacing any older backup.
///
/// Returns the backup location, or `None` when there is no list to back up.
pub async fn backup_plugins_file(
    plugins_file: &Utf8Path,
    backup_dir: &Utf8Path,
    profile: &str,
) -> Result<Option<Utf8PathBuf>, LoadOrderError> {
    if !tokio::fs::try_exists(plugins_file).await.unwrap_or(false) {
        tracing::debug!("No plugin list at {}, nothing to back up", plugins_file);
        return Ok(None);
    }

    let target = backup_path(backup_dir, profile, plugins_file)?;
    let backup_error = |source| LoadOrderError::Backup {
        path: target.clone(),
        source,
    };

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(backup_error)?;
    }
    tokio::fs::copy(plugins_file, &target)
        .await
        .map_err(backup_error)?;

    tracing::info!("Backed up {} to {}", plugins_file, target);
    Ok(Some(target))
}

/// Put the backup for `profile` back in place and delete it.
///
/// Returns whether a backup existed.
pub async fn restore_plugins_file(
    plugins_file: &Utf8Path,
    backup_dir: &Utf8Path,
    profile: &str,
) -> Result<bool, LoadOrderError> {
    let source_path = backup_path(backup_dir, profile, plugins_file)?;
    if !tokio::fs::try_exists(&source_path).await.unwrap_or(false) {
        tracing::debug!("No plugin list backup for profile {}", profile);
        return Ok(false);
    }

    let restore_error = |source| LoadOrderError::Backup {
        path: source_path.clone(),
        source,
    };

    let content = tokio::fs::read_to_string(&source_path)
        .await
        .map_err(restore_error)?;
    write_raw(plugins_file, &content).await?;
    if let Err(e) = tokio::fs::remove_file(&source_path).await {
        tracing::warn!("Restored {} but could not remove the backup: {}", plugins_file, e);
    }

    tracing::info!("Restored {} from profile {} backup", plugins_file, profile);
    Ok(true)
}
