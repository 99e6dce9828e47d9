//! Descriptors and metadata for managed config files.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

/// Identity and seed for one managed config file.
#[derive(Debug, Clone)]
pub struct ConfigDescriptor {
    /// Logical config id; also the directory name under the config root.
    pub config_id: String,
    /// File name relative to the config's directory.
    pub file_name: String,
    /// Expected schema version.
    pub version: String,
    /// Seed for new files and source of truth for newly introduced keys
    /// during migration.
    pub default: Value,
}

impl ConfigDescriptor {
    /// Descriptor for the primary `config.jsonc` of a config id.
    ///
    /// The `version` and `configId` keys are stamped into the default if it
    /// is an object that lacks them, so a seeded file always carries its
    /// own identity.
    pub fn new(
        config_id: impl Into<String>,
        version: impl Into<String>,
        default: Value,
    ) -> Self {
        Self::with_file_name(config_id, "config.jsonc", version, default)
    }

    /// Descriptor for an explicitly named file.
    pub fn with_file_name(
        config_id: impl Into<String>,
        file_name: impl Into<String>,
        version: impl Into<String>,
        default: Value,
    ) -> Self {
        let config_id = config_id.into();
        let version = version.into();
        let mut default = default;
        if let Value::Object(map) = &mut default {
            map.entry("version")
                .or_insert_with(|| Value::String(version.clone()));
            map.entry("configId")
                .or_insert_with(|| Value::String(config_id.clone()));
        }
        Self {
            config_id,
            file_name: file_name.into(),
            version,
            default,
        }
    }
}

/// Knobs for the background change watcher and auto-save loop.
#[derive(Debug, Clone)]
pub struct WatcherSettings {
    /// Whether the file watcher starts with the store.
    pub enabled: bool,
    /// How long to wait after a change notification before reloading.
    pub debounce: Duration,
    /// Whether the auto-save loop starts with the store.
    pub auto_save_enabled: bool,
    /// How often dirty containers are flushed.
    pub auto_save_interval: Duration,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            debounce: Duration::from_millis(1000),
            auto_save_enabled: false,
            auto_save_interval: Duration::from_secs(30),
        }
    }
}

/// Presentation and behavior metadata for a managed file.
#[derive(Debug, Clone)]
pub struct ConfigMetadata {
    /// Free-form lines for the header comment block.
    pub header_comments: Vec<String>,
    /// Free-form lines for the footer comment block.
    pub footer_comments: Vec<String>,
    /// Comments emitted above specific properties on every save; these take
    /// precedence over comments harvested from the file itself.
    pub section_comments: HashMap<String, String>,
    /// Emit a `Version:` line in the header.
    pub include_version: bool,
    /// Emit a `Last updated:` line in the header.
    pub include_timestamp: bool,
    /// Background loop settings.
    pub watcher: WatcherSettings,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        Self {
            header_comments: Vec::new(),
            footer_comments: Vec::new(),
            section_comments: HashMap::new(),
            include_version: true,
            include_timestamp: true,
            watcher: WatcherSettings::default(),
        }
    }
}

impl ConfigMetadata {
    /// Standard metadata for a config id: the usual two header lines,
    /// version and timestamp included, background loops off.
    pub fn for_config(config_id: &str) -> Self {
        Self {
            header_comments: vec![
                format!("Configuration file for {config_id}"),
                "This file is automatically managed - custom comments will be preserved"
                    .to_string(),
            ],
            ..Self::default()
        }
    }
}
