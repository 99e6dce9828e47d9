//! Error taxonomy for the config store.
//!
//! Recoverable conditions (missing file, empty file, syntax error, version
//! mismatch, failed restore) are handled inside the store and never reach
//! callers; these variants cover the boundary where propagation is correct:
//! opening the store, explicit saves, and watcher registration.

use std::path::PathBuf;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to prepare config directory {}: {source}", path.display())]
    Init {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("structural syntax error: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("config file is empty")]
    EmptyFile,

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("no config registered for file {0:?}")]
    UnknownFile(String),

    #[error("a config is already registered for file {0:?}")]
    DuplicateFile(String),
}
