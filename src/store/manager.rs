//! The store facade: open, read, save, reload, background loop control.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::persistence::engine;
use crate::store::container::Container;
use crate::store::descriptor::{ConfigDescriptor, ConfigMetadata, WatcherSettings};
use crate::store::error::{StoreError, StoreResult};
use crate::store::orchestrator;
use crate::store::registry::ContainerRegistry;
use crate::store::StoreContext;
use crate::tasks::{autosave, watcher, TaskHandle};

/// A self-healing, hot-reloadable store for one config id's files.
///
/// Owned by its caller; dropping it without [`close`](Self::close) leaves
/// the background loops running detached until the runtime shuts down.
pub struct ConfigStore {
    ctx: Arc<StoreContext>,
    primary: Arc<Container>,
    root: PathBuf,
    settings: WatcherSettings,
    watcher: Mutex<Option<TaskHandle>>,
    autosave: Mutex<Option<TaskHandle>>,
}

impl ConfigStore {
    /// Open (or create) the store for `descriptor` under `config_dir`.
    ///
    /// Creates `<config_dir>/<config_id>/` and its `backups/` directory,
    /// seeds the primary file from the default if it is missing, loads it
    /// otherwise, and starts whichever background loops the metadata's
    /// watcher settings enable. Only directory creation failures abort;
    /// every file-level problem is recovered internally.
    pub async fn open(
        descriptor: ConfigDescriptor,
        metadata: ConfigMetadata,
        config_dir: impl AsRef<Path>,
    ) -> StoreResult<Self> {
        let root = config_dir.as_ref().join(&descriptor.config_id);
        let backup_dir = root.join("backups");
        for dir in [&root, &backup_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| StoreError::Init {
                    path: dir.clone(),
                    source,
                })?;
        }
        // Canonical paths make watcher notifications match containers by
        // equality.
        let root = tokio::fs::canonicalize(&root)
            .await
            .map_err(|source| StoreError::Init {
                path: root.clone(),
                source,
            })?;
        let backup_dir = root.join("backups");

        let settings = metadata.watcher.clone();
        let file_path = root.join(&descriptor.file_name);
        let primary = Arc::new(Container::new(descriptor, metadata, file_path));

        let registry = ContainerRegistry::new();
        registry
            .insert(Arc::clone(&primary))
            .map_err(|dup| StoreError::DuplicateFile(dup.descriptor().file_name.clone()))?;

        let ctx = Arc::new(StoreContext {
            registry,
            backup_dir,
        });

        orchestrator::reload(&ctx, &primary).await;

        let store = Self {
            ctx,
            primary,
            root,
            settings,
            watcher: Mutex::new(None),
            autosave: Mutex::new(None),
        };
        if store.settings.enabled {
            store.enable_watcher().await?;
        }
        if store.settings.auto_save_enabled {
            store.enable_auto_save().await;
        }
        Ok(store)
    }

    /// The config id this store manages.
    pub fn config_id(&self) -> &str {
        &self.primary.descriptor().config_id
    }

    /// Resolved directory holding this config's files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The primary file's authoritative value. Never fails; always the
    /// default, a parsed value, a migrated value, or a restored value.
    pub fn current_value(&self) -> Arc<Value> {
        self.primary.current()
    }

    /// The primary value deserialized into a typed config.
    pub fn current_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value((*self.primary.current()).clone())
    }

    /// The authoritative value of a secondary file.
    pub fn value_of(&self, file_name: &str) -> Option<Arc<Value>> {
        self.ctx
            .registry
            .get(file_name)
            .map(|container| container.current())
    }

    /// Comments harvested from the primary file's most recent parse.
    pub fn comments(&self) -> Arc<HashMap<String, String>> {
        self.primary.comments()
    }

    /// Replace the primary in-memory value without persisting. The
    /// auto-save loop flushes it on its next pass.
    pub fn set_value(&self, value: Value) {
        self.primary.set_current(value);
    }

    /// Replace and persist the primary value. On an I/O failure the value
    /// stays in memory and the next auto-save retries.
    pub async fn save_value(&self, value: Value) -> StoreResult<()> {
        save_to(&self.primary, value).await
    }

    /// Replace and persist a secondary file's value.
    pub async fn save_file_value(&self, file_name: &str, value: Value) -> StoreResult<()> {
        let container = self
            .ctx
            .registry
            .get(file_name)
            .ok_or_else(|| StoreError::UnknownFile(file_name.to_string()))?;
        save_to(&container, value).await
    }

    /// Reload every managed file from disk now.
    pub async fn reload_manually(&self) {
        for container in self.ctx.registry.all() {
            orchestrator::reload(&self.ctx, &container).await;
        }
    }

    /// Register an additional file under the same config id. The file is
    /// seeded or loaded immediately; a running watcher is restarted so the
    /// new file's directory is covered.
    pub async fn register_secondary_config(
        &self,
        file_name: &str,
        default: Value,
        metadata: ConfigMetadata,
    ) -> StoreResult<()> {
        let descriptor = ConfigDescriptor::with_file_name(
            self.config_id(),
            file_name,
            self.primary.descriptor().version.clone(),
            default,
        );
        let file_path = self.root.join(file_name);
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Init {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let container = Arc::new(Container::new(descriptor, metadata, file_path));
        self.ctx
            .registry
            .insert(Arc::clone(&container))
            .map_err(|_| StoreError::DuplicateFile(file_name.to_string()))?;

        orchestrator::reload(&self.ctx, &container).await;

        let mut guard = self.watcher.lock().await;
        if let Some(handle) = guard.take() {
            handle.stop().await;
            *guard = Some(watcher::spawn(
                Arc::clone(&self.ctx),
                self.settings.debounce,
            )?);
        }
        Ok(())
    }

    /// Start the change watcher. A no-op if it is already running.
    pub async fn enable_watcher(&self) -> StoreResult<()> {
        let mut guard = self.watcher.lock().await;
        if guard.is_none() {
            *guard = Some(watcher::spawn(
                Arc::clone(&self.ctx),
                self.settings.debounce,
            )?);
        }
        Ok(())
    }

    /// Stop the change watcher. Manual reload stays available.
    pub async fn disable_watcher(&self) {
        if let Some(handle) = self.watcher.lock().await.take() {
            handle.stop().await;
        }
    }

    /// Start the auto-save loop. A no-op if it is already running.
    pub async fn enable_auto_save(&self) {
        let mut guard = self.autosave.lock().await;
        if guard.is_none() {
            *guard = Some(autosave::spawn(
                Arc::clone(&self.ctx),
                self.settings.auto_save_interval,
            ));
        }
    }

    /// Stop the auto-save loop.
    pub async fn disable_auto_save(&self) {
        if let Some(handle) = self.autosave.lock().await.take() {
            handle.stop().await;
        }
    }

    /// Stop both background loops. No persistent state is dropped; the
    /// files stay as last written.
    pub async fn close(&self) {
        self.disable_watcher().await;
        self.disable_auto_save().await;
    }
}

async fn save_to(container: &Container, value: Value) -> StoreResult<()> {
    container.set_current(value.clone());
    match engine::write_value(container, &value).await {
        Ok(()) => Ok(()),
        Err(error) => {
            tracing::error!(
                path = %container.file_path().display(),
                %error,
                "explicit save failed; value kept in memory for retry"
            );
            Err(error)
        }
    }
}
