//! Disk persistence for managed config files.
//!
//! # Data Flow
//! ```text
//! save:
//!     Value → format::writer (header/footer + comments) → tokio::fs::write
//!           → refresh cached file attrs → record saved hash
//!
//! recover:
//!     backup.rs snapshots the on-disk file before destructive operations,
//!     prunes old snapshots, and restores the newest parseable one
//! ```
//!
//! # Design Decisions
//! - Save and backup I/O failures are logged and abandoned for the cycle;
//!   the in-memory value is untouched and retried on the next flush
//! - Backup retention is evaluated over the whole backup directory, not
//!   per source file

pub mod backup;
pub mod engine;
