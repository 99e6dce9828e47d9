//! In-memory registry of managed containers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::store::container::Container;

/// All containers of one store, keyed by relative file name.
#[derive(Default)]
pub struct ContainerRegistry {
    containers: DashMap<String, Arc<Container>>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a container. Fails if the file name is already taken —
    /// exactly one container exists per file.
    pub(crate) fn insert(&self, container: Arc<Container>) -> Result<(), Arc<Container>> {
        let key = container.descriptor().file_name.clone();
        match self.containers.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(container),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(container);
                Ok(())
            }
        }
    }

    pub fn get(&self, file_name: &str) -> Option<Arc<Container>> {
        self.containers.get(file_name).map(|entry| Arc::clone(&entry))
    }

    /// Match a filesystem path back to its container.
    pub fn by_path(&self, path: &Path) -> Option<Arc<Container>> {
        self.containers
            .iter()
            .find(|entry| entry.file_path() == path)
            .map(|entry| Arc::clone(&entry))
    }

    pub fn all(&self) -> Vec<Arc<Container>> {
        self.containers
            .iter()
            .map(|entry| Arc::clone(&entry))
            .collect()
    }

    /// Distinct parent directories of all managed files; the watcher
    /// registers one subscription per directory.
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .containers
            .iter()
            .filter_map(|entry| entry.file_path().parent().map(Path::to_path_buf))
            .collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }
}
