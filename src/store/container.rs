//! Runtime record for one managed config file.
//!
//! Every field read by foreground callers is swapped, never mutated in
//! place: readers always observe a fully formed value.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;

use crate::store::descriptor::{ConfigDescriptor, ConfigMetadata};

/// Content hash of a structural value, computed over its canonical JSON
/// text. Used to detect dirty containers for auto-save.
pub fn value_hash(value: &Value) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    if let Ok(text) = serde_json::to_string(value) {
        text.hash(&mut hasher);
    }
    hasher.finish()
}

/// One managed config file: its authoritative value, fallback value,
/// harvested comments, and cached file attributes.
#[derive(Debug)]
pub struct Container {
    descriptor: ConfigDescriptor,
    metadata: ConfigMetadata,
    file_path: PathBuf,

    current: ArcSwap<Value>,
    last_valid: ArcSwap<Value>,
    comments: ArcSwap<HashMap<String, String>>,

    last_saved_hash: AtomicU64,
    last_modified_ms: AtomicI64,
    last_file_size: AtomicU64,
}

impl Container {
    pub(crate) fn new(
        descriptor: ConfigDescriptor,
        metadata: ConfigMetadata,
        file_path: PathBuf,
    ) -> Self {
        let default = descriptor.default.clone();
        let hash = value_hash(&default);
        Self {
            descriptor,
            metadata,
            file_path,
            current: ArcSwap::from_pointee(default.clone()),
            last_valid: ArcSwap::from_pointee(default),
            comments: ArcSwap::from_pointee(HashMap::new()),
            last_saved_hash: AtomicU64::new(hash),
            last_modified_ms: AtomicI64::new(0),
            last_file_size: AtomicU64::new(0),
        }
    }

    pub fn descriptor(&self) -> &ConfigDescriptor {
        &self.descriptor
    }

    pub(crate) fn metadata(&self) -> &ConfigMetadata {
        &self.metadata
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// The value currently considered authoritative.
    pub fn current(&self) -> Arc<Value> {
        self.current.load_full()
    }

    /// The most recent value known to have parsed successfully.
    pub fn last_valid(&self) -> Arc<Value> {
        self.last_valid.load_full()
    }

    /// Comments harvested from the most recent successful parse.
    pub fn comments(&self) -> Arc<HashMap<String, String>> {
        self.comments.load_full()
    }

    /// Swap in a new current value without touching `last_valid`.
    pub(crate) fn set_current(&self, value: Value) {
        self.current.store(Arc::new(value));
    }

    /// Adopt a value as both current and last-known-good.
    pub(crate) fn adopt(&self, value: Value) {
        let value = Arc::new(value);
        self.current.store(Arc::clone(&value));
        self.last_valid.store(value);
    }

    /// Replace the comment map wholesale.
    pub(crate) fn replace_comments(&self, comments: HashMap<String, String>) {
        self.comments.store(Arc::new(comments));
    }

    /// Record that `value` is what the file now holds.
    pub(crate) fn mark_saved(&self, value: &Value) {
        self.last_saved_hash
            .store(value_hash(value), Ordering::Release);
    }

    /// Whether the in-memory value has diverged from the last save.
    pub fn is_dirty(&self) -> bool {
        value_hash(&self.current()) != self.last_saved_hash.load(Ordering::Acquire)
    }

    /// Compare freshly observed file attributes against the cached ones.
    /// Returns true when the file actually changed; the cache is updated
    /// only in that case.
    pub(crate) fn observe_attrs(&self, modified_ms: i64, size: u64) -> bool {
        let changed = modified_ms > self.last_modified_ms.load(Ordering::Acquire)
            || size != self.last_file_size.load(Ordering::Acquire);
        if changed {
            self.record_attrs(modified_ms, size);
        }
        changed
    }

    /// Unconditionally refresh the cached file attributes, e.g. after a
    /// self-write, so the watcher does not re-trigger on it.
    pub(crate) fn record_attrs(&self, modified_ms: i64, size: u64) {
        self.last_modified_ms.store(modified_ms, Ordering::Release);
        self.last_file_size.store(size, Ordering::Release);
    }
}
