//! Shared fixtures for the store integration tests.

use std::path::{Path, PathBuf};

use config_store::{ConfigDescriptor, ConfigMetadata, ConfigStore, WatcherSettings};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Typed view of the test schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    pub version: String,
    pub config_id: String,
    pub test_setting: String,
    pub numeric_setting: i64,
}

pub fn default_value() -> Value {
    json!({
        "version": "1.0",
        "configId": "test",
        "testSetting": "default",
        "numericSetting": 42
    })
}

pub fn descriptor() -> ConfigDescriptor {
    ConfigDescriptor::new("test", "1.0", default_value())
}

/// Metadata with timestamps off so test output is deterministic, and with
/// the given background loop settings.
pub fn metadata(watcher: WatcherSettings) -> ConfigMetadata {
    ConfigMetadata {
        header_comments: vec!["Test Configuration".to_string()],
        include_timestamp: false,
        watcher,
        ..ConfigMetadata::default()
    }
}

/// Install a test subscriber so `RUST_LOG=config_store=debug` shows the
/// store's recovery decisions. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Open a store with background loops off.
pub async fn open_store(dir: &Path) -> ConfigStore {
    init_tracing();
    ConfigStore::open(descriptor(), metadata(WatcherSettings::default()), dir)
        .await
        .expect("store should open")
}

pub fn config_file(dir: &Path) -> PathBuf {
    dir.join("test").join("config.jsonc")
}

pub fn backup_dir(dir: &Path) -> PathBuf {
    dir.join("test").join("backups")
}

/// Count backup files carrying the given reason tag.
pub fn backups_tagged(dir: &Path, reason: &str) -> usize {
    let needle = format!("_{reason}_");
    match std::fs::read_dir(backup_dir(dir)) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains(&needle))
            .count(),
        Err(_) => 0,
    }
}
