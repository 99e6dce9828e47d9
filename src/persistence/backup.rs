//! Snapshot and restore for managed config files.
//!
//! Backups live in the config's `backups/` directory, named
//! `<configId>_<fileStem>_<reason>_<yyyyMMdd_HHmmss>.jsonc`. Retention
//! keeps the 50 lexicographically greatest names across the whole
//! directory.

use std::path::Path;

use chrono::Local;
use serde_json::Value;
use tokio::fs;

use crate::format::parser;
use crate::store::container::Container;

/// Retention cap for the backup directory as a whole.
pub const MAX_BACKUPS: usize = 50;

const BACKUP_EXT: &str = ".jsonc";

fn backup_prefix(container: &Container) -> String {
    let stem = container
        .file_path()
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("config");
    format!("{}_{}", container.descriptor().config_id, stem)
}

/// Snapshot the container's on-disk file under a reason tag, then prune
/// old snapshots. Failures are logged and swallowed: a backup must never
/// take down the operation it is protecting.
pub async fn create_backup(container: &Container, backup_dir: &Path, reason: &str) {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let name = format!(
        "{}_{}_{}{}",
        backup_prefix(container),
        reason,
        timestamp,
        BACKUP_EXT
    );
    let target = backup_dir.join(&name);

    if let Err(error) = fs::copy(container.file_path(), &target).await {
        tracing::error!(
            path = %container.file_path().display(),
            backup = %name,
            %error,
            "config backup failed"
        );
        return;
    }
    tracing::debug!(backup = %name, reason, "config file backed up");

    if let Err(error) = prune(backup_dir).await {
        tracing::error!(dir = %backup_dir.display(), %error, "backup pruning failed");
    }
}

/// Delete everything beyond the `MAX_BACKUPS` most recent snapshots.
/// The timestamp suffix makes lexicographic order chronological for a
/// given source and reason.
async fn prune(backup_dir: &Path) -> std::io::Result<()> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(backup_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(BACKUP_EXT) {
            names.push(name);
        }
    }

    names.sort();
    names.reverse();
    for name in names.into_iter().skip(MAX_BACKUPS) {
        fs::remove_file(backup_dir.join(&name)).await?;
    }
    Ok(())
}

/// Parse the most recent backup for this container, or `None` when no
/// backup exists or the most recent one fails to parse. An unparseable
/// newest backup is not skipped in favor of an older one; restoration
/// gives up and the caller falls through to its next fallback.
pub async fn restore_latest(container: &Container, backup_dir: &Path) -> Option<Value> {
    let prefix = backup_prefix(container);

    let mut latest: Option<String> = None;
    let mut entries = match fs::read_dir(backup_dir).await {
        Ok(entries) => entries,
        Err(_) => {
            tracing::info!(dir = %backup_dir.display(), "no backup directory");
            return None;
        }
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(&prefix) && name.ends_with(BACKUP_EXT) {
            if latest.as_deref().map_or(true, |best| name.as_str() > best) {
                latest = Some(name);
            }
        }
    }

    let name = match latest {
        Some(name) => name,
        None => {
            tracing::info!(dir = %backup_dir.display(), "no backups found");
            return None;
        }
    };

    let raw = match fs::read_to_string(backup_dir.join(&name)).await {
        Ok(raw) => raw,
        Err(error) => {
            tracing::warn!(backup = %name, %error, "failed to read backup");
            return None;
        }
    };

    let doc = parser::parse_with_comments(&raw);
    match serde_json::from_str(&doc.content) {
        Ok(value) => {
            tracing::info!(backup = %name, "restored config from backup");
            Some(value)
        }
        Err(error) => {
            tracing::warn!(backup = %name, %error, "latest backup failed to parse");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::descriptor::{ConfigDescriptor, ConfigMetadata};
    use serde_json::json;
    use std::path::PathBuf;

    fn container_at(file_path: PathBuf) -> Container {
        let descriptor = ConfigDescriptor::new(
            "test",
            "1.0",
            json!({"testSetting": "default", "numericSetting": 42}),
        );
        Container::new(descriptor, ConfigMetadata::for_config("test"), file_path)
    }

    #[tokio::test]
    async fn retention_keeps_the_fifty_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.jsonc");
        std::fs::write(&file_path, "{\"version\":\"1.0\"}").unwrap();
        let backup_dir = dir.path().join("backups");
        std::fs::create_dir_all(&backup_dir).unwrap();
        let container = container_at(file_path);

        // Distinct reasons keep the names unique within one second.
        for index in 0..60 {
            create_backup(&container, &backup_dir, &format!("r{index:02}")).await;
        }

        let mut names: Vec<String> = std::fs::read_dir(&backup_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), MAX_BACKUPS);
        // The lexicographically smallest survivors are the r10 batch; the
        // first ten snapshots were pruned.
        assert!(names[0].contains("_r10_"));
    }

    #[tokio::test]
    async fn restores_the_latest_backup() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.jsonc");
        let backup_dir = dir.path().join("backups");
        std::fs::create_dir_all(&backup_dir).unwrap();
        let container = container_at(file_path.clone());

        std::fs::write(&file_path, "{\"version\":\"1.0\",\"numericSetting\":1}").unwrap();
        create_backup(&container, &backup_dir, "a_first").await;
        std::fs::write(&file_path, "{\"version\":\"1.0\",\"numericSetting\":2}").unwrap();
        create_backup(&container, &backup_dir, "b_second").await;

        let restored = restore_latest(&container, &backup_dir)
            .await
            .expect("restore should succeed");
        assert_eq!(restored["numericSetting"], 2);
    }

    #[tokio::test]
    async fn unparseable_latest_backup_is_not_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.jsonc");
        let backup_dir = dir.path().join("backups");
        std::fs::create_dir_all(&backup_dir).unwrap();
        let container = container_at(file_path.clone());

        std::fs::write(&file_path, "{\"version\":\"1.0\"}").unwrap();
        create_backup(&container, &backup_dir, "a_good").await;
        std::fs::write(&file_path, "{ corrupt").unwrap();
        create_backup(&container, &backup_dir, "b_corrupt").await;

        assert!(restore_latest(&container, &backup_dir).await.is_none());
    }

    #[tokio::test]
    async fn no_backups_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let backup_dir = dir.path().join("backups");
        std::fs::create_dir_all(&backup_dir).unwrap();
        let container = container_at(dir.path().join("config.jsonc"));

        assert!(restore_latest(&container, &backup_dir).await.is_none());
    }
}
