//! End-to-end behavior of the config store: seeding, reload, self-heal,
//! migration, background loops.

mod common;

use std::time::Duration;

use common::{
    backup_dir, backups_tagged, config_file, default_value, descriptor, init_tracing,
    metadata, open_store, TestConfig,
};
use config_store::{ConfigDescriptor, ConfigMetadata, ConfigStore, WatcherSettings};
use serde_json::json;

#[tokio::test]
async fn open_seeds_a_missing_file_from_the_default() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;

    let raw = std::fs::read_to_string(config_file(dir.path())).unwrap();
    assert!(raw.starts_with("/* CONFIG_SECTION"));
    assert!(raw.contains("END_CONFIG_SECTION"));
    assert_eq!(*store.current_value(), default_value());
}

#[tokio::test]
async fn manual_reload_picks_up_an_external_edit() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;

    let edited = r#"
        /* CONFIG_SECTION
         * Test Configuration
         * Version: 1.0
         */
        {
          "version": "1.0",
          "configId": "test",
          "testSetting": "modified",
          "numericSetting": 100
        }
        /* END_CONFIG_SECTION */
    "#;
    std::fs::write(config_file(dir.path()), edited).unwrap();

    store.reload_manually().await;

    let value = store.current_value();
    assert_eq!(value["testSetting"], "modified");
    assert_eq!(value["numericSetting"], 100);
}

#[tokio::test]
async fn invalid_json_heals_back_to_the_default_and_leaves_a_backup() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;

    std::fs::write(config_file(dir.path()), "{ invalid json }").unwrap();
    store.reload_manually().await;

    let value = store.current_value();
    assert_eq!(value["testSetting"], "default");
    assert_eq!(value["numericSetting"], 42);
    assert_eq!(backups_tagged(dir.path(), "json_error"), 1);

    // The healed file on disk parses again.
    let raw = std::fs::read_to_string(config_file(dir.path())).unwrap();
    assert!(raw.contains("\"testSetting\": \"default\""));
}

#[tokio::test]
async fn an_emptied_file_heals_too() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;

    std::fs::write(config_file(dir.path()), "   \n").unwrap();
    store.reload_manually().await;

    assert_eq!(*store.current_value(), default_value());
    assert_eq!(backups_tagged(dir.path(), "empty_file"), 1);
}

#[tokio::test]
async fn self_heal_prefers_the_last_known_good_value() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;

    let good = json!({
        "version": "1.0",
        "configId": "test",
        "testSetting": "modified",
        "numericSetting": 100
    });
    std::fs::write(
        config_file(dir.path()),
        serde_json::to_string(&good).unwrap(),
    )
    .unwrap();
    store.reload_manually().await;
    assert_eq!(store.current_value()["testSetting"], "modified");

    std::fs::write(config_file(dir.path()), "{ corrupt").unwrap();
    store.reload_manually().await;

    // No parseable backup exists, so recovery falls back to the last
    // value that parsed successfully.
    let value = store.current_value();
    assert_eq!(value["testSetting"], "modified");
    assert_eq!(value["numericSetting"], 100);
}

#[tokio::test]
async fn an_older_version_is_migrated_and_user_values_survive() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;

    let old = r#"{
        "version": "0.9",
        "configId": "test",
        "testSetting": "old_value",
        "numericSetting": 99
    }"#;
    std::fs::write(config_file(dir.path()), old).unwrap();
    store.reload_manually().await;

    let value = store.current_value();
    assert_eq!(value["version"], "1.0");
    assert_eq!(value["testSetting"], "old_value");
    assert_eq!(value["numericSetting"], 99);
    assert_eq!(backups_tagged(dir.path(), "pre_migration"), 1);
}

#[tokio::test]
async fn migration_fills_newly_introduced_fields_from_the_default() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("test");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(
        root.join("config.jsonc"),
        r#"{
            "version": "1.0",
            "configId": "test",
            "testSetting": "custom",
            "numericSetting": 7
        }"#,
    )
    .unwrap();

    let descriptor = ConfigDescriptor::new(
        "test",
        "1.1",
        json!({
            "version": "1.1",
            "configId": "test",
            "testSetting": "default",
            "numericSetting": 42,
            "newSetting": "fresh"
        }),
    );
    let store = ConfigStore::open(
        descriptor,
        metadata(WatcherSettings::default()),
        dir.path(),
    )
    .await
    .unwrap();

    let value = store.current_value();
    assert_eq!(value["version"], "1.1");
    assert_eq!(value["testSetting"], "custom");
    assert_eq!(value["numericSetting"], 7);
    assert_eq!(value["newSetting"], "fresh");
}

#[tokio::test]
async fn auto_save_flushes_an_in_memory_mutation() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let settings = WatcherSettings {
        auto_save_enabled: true,
        auto_save_interval: Duration::from_millis(200),
        ..WatcherSettings::default()
    };
    let store = ConfigStore::open(descriptor(), metadata(settings), dir.path())
        .await
        .unwrap();

    let mut value = default_value();
    value["testSetting"] = json!("changed-in-memory");
    store.set_value(value);

    let mut flushed = false;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let raw = std::fs::read_to_string(config_file(dir.path())).unwrap();
        if raw.contains("changed-in-memory") {
            flushed = true;
            break;
        }
    }
    store.close().await;
    assert!(flushed, "auto-save never flushed the dirty value");
}

#[tokio::test]
async fn the_watcher_reloads_after_an_external_write() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let settings = WatcherSettings {
        enabled: true,
        debounce: Duration::from_millis(100),
        ..WatcherSettings::default()
    };
    let store = ConfigStore::open(descriptor(), metadata(settings), dir.path())
        .await
        .unwrap();

    // Give the subscription a moment to settle before editing.
    tokio::time::sleep(Duration::from_millis(200)).await;
    std::fs::write(
        config_file(dir.path()),
        r#"{
            "version": "1.0",
            "configId": "test",
            "testSetting": "watched",
            "numericSetting": 7
        }"#,
    )
    .unwrap();

    let mut reloaded = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if store.current_value()["testSetting"] == "watched" {
            reloaded = true;
            break;
        }
    }
    store.close().await;
    assert!(reloaded, "watcher never picked up the external edit");
}

#[tokio::test]
async fn disabling_the_watcher_leaves_manual_reload_working() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let settings = WatcherSettings {
        enabled: true,
        debounce: Duration::from_millis(50),
        ..WatcherSettings::default()
    };
    let store = ConfigStore::open(descriptor(), metadata(settings), dir.path())
        .await
        .unwrap();
    store.disable_watcher().await;

    std::fs::write(
        config_file(dir.path()),
        r#"{"version":"1.0","configId":"test","testSetting":"manual","numericSetting":1}"#,
    )
    .unwrap();
    store.reload_manually().await;
    assert_eq!(store.current_value()["testSetting"], "manual");
}

#[tokio::test]
async fn user_comments_survive_a_rewrite() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;

    std::fs::write(
        config_file(dir.path()),
        r#"{
            "version": "1.0",
            "configId": "test",
            "testSetting": "default", // tuned by hand
            "numericSetting": 42
        }"#,
    )
    .unwrap();
    store.reload_manually().await;
    assert_eq!(
        store.comments().get("testSetting").map(String::as_str),
        Some("tuned by hand")
    );

    let mut value = (*store.current_value()).clone();
    value["numericSetting"] = json!(43);
    store.save_value(value).await.unwrap();

    let raw = std::fs::read_to_string(config_file(dir.path())).unwrap();
    let comment_line = raw
        .lines()
        .position(|line| line.trim() == "// tuned by hand")
        .expect("comment should be re-emitted");
    assert!(raw
        .lines()
        .nth(comment_line + 1)
        .unwrap()
        .trim_start()
        .starts_with("\"testSetting\""));
}

#[tokio::test]
async fn secondary_configs_are_seeded_and_saved_independently() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;

    store
        .register_secondary_config(
            "extra.jsonc",
            json!({"featureFlag": false}),
            ConfigMetadata::for_config("test"),
        )
        .await
        .unwrap();

    let seeded = store.value_of("extra.jsonc").expect("secondary registered");
    assert_eq!(seeded["featureFlag"], false);
    assert!(dir.path().join("test").join("extra.jsonc").exists());

    store
        .save_file_value("extra.jsonc", json!({"version": "1.0", "featureFlag": true}))
        .await
        .unwrap();
    let saved = store.value_of("extra.jsonc").unwrap();
    assert_eq!(saved["featureFlag"], true);

    // The primary file is untouched.
    assert_eq!(store.current_value()["testSetting"], "default");

    // A second registration under the same name is rejected.
    assert!(store
        .register_secondary_config(
            "extra.jsonc",
            json!({}),
            ConfigMetadata::for_config("test")
        )
        .await
        .is_err());
}

#[tokio::test]
async fn typed_access_deserializes_the_current_value() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;

    let typed: TestConfig = store.current_as().unwrap();
    assert_eq!(typed.version, "1.0");
    assert_eq!(typed.config_id, "test");
    assert_eq!(typed.test_setting, "default");
    assert_eq!(typed.numeric_setting, 42);
}

#[tokio::test]
async fn independent_stores_do_not_share_state() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let store_a = open_store(dir_a.path()).await;
    let store_b = open_store(dir_b.path()).await;

    let mut value = default_value();
    value["testSetting"] = json!("only-in-a");
    store_a.save_value(value).await.unwrap();

    assert_eq!(store_a.current_value()["testSetting"], "only-in-a");
    assert_eq!(store_b.current_value()["testSetting"], "default");
    assert!(backup_dir(dir_b.path()).exists());
}
