//! Self-healing, hot-reloadable, multi-file configuration store.
//!
//! Persists structured configuration as comment-preserving JSONC, watches
//! for external edits, migrates old schema versions forward without losing
//! user-set values, and recovers automatically from corruption.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────────────────────┐
//!                 │                 CONFIG STORE                  │
//!                 │                                               │
//!   application   │  ┌──────────┐   ┌───────────┐   ┌─────────┐  │
//!   reads ────────┼─▶│  store   │──▶│ container │◀──│ format  │  │
//!                 │  │  facade  │   │ registry  │   │ parser/ │  │
//!                 │  └──────────┘   └─────┬─────┘   │ writer  │  │
//!                 │                       │         └─────────┘  │
//!                 │                       ▼                      │
//!                 │               ┌──────────────┐               │
//!   external      │  ┌─────────┐  │ orchestrator │  ┌─────────┐  │
//!   edits ────────┼─▶│ watcher │─▶│ reload/merge │◀─│autosave │  │
//!                 │  └─────────┘  │ /self-heal   │  └─────────┘  │
//!                 │               └──────┬───────┘               │
//!                 │                      ▼                       │
//!                 │            ┌──────────────────┐              │
//!                 │            │   persistence    │              │
//!                 │            │ engine + backups │              │
//!                 │            └──────────────────┘              │
//!                 └───────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use config_store::{ConfigDescriptor, ConfigMetadata, ConfigStore};
//! use serde_json::json;
//!
//! # async fn example() -> config_store::StoreResult<()> {
//! let descriptor = ConfigDescriptor::new(
//!     "myapp",
//!     "1.0",
//!     json!({"greeting": "hello", "retries": 3}),
//! );
//! let store = ConfigStore::open(
//!     descriptor,
//!     ConfigMetadata::for_config("myapp"),
//!     "config",
//! )
//! .await?;
//!
//! let value = store.current_value();
//! println!("greeting = {}", value["greeting"]);
//! store.close().await;
//! # Ok(())
//! # }
//! ```

pub mod format;
pub mod merge;
pub mod persistence;
pub mod store;
pub mod tasks;

pub use store::descriptor::{ConfigDescriptor, ConfigMetadata, WatcherSettings};
pub use store::error::{StoreError, StoreResult};
pub use store::manager::ConfigStore;
pub use store::schema::{FieldKind, FieldSpec, SchemaDescriptor};
