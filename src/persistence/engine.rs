//! Serialize-and-write path plus the cheap file change pre-check.

use std::time::UNIX_EPOCH;

use serde_json::Value;

use crate::format::writer;
use crate::store::container::Container;
use crate::store::error::{StoreError, StoreResult};

/// Serialize `value` and write it to the container's file with
/// create-or-truncate semantics, then refresh the cached file attributes
/// so the watcher does not re-trigger on our own write, and record the
/// saved hash.
pub async fn write_value(container: &Container, value: &Value) -> StoreResult<()> {
    let text = writer::render_document(
        value,
        &container.descriptor().version,
        container.metadata(),
        &container.comments(),
    )?;

    tokio::fs::write(container.file_path(), text)
        .await
        .map_err(|source| StoreError::Io {
            path: container.file_path().to_path_buf(),
            source,
        })?;

    refresh_attrs(container).await;
    container.mark_saved(value);
    Ok(())
}

/// `write_value`, with failures logged and swallowed. Used by the
/// background paths where a failed save must not take down recovery; the
/// value stays in memory and the next auto-save retries.
pub async fn flush(container: &Container, value: &Value) {
    if let Err(error) = write_value(container, value).await {
        tracing::error!(
            path = %container.file_path().display(),
            %error,
            "config save failed"
        );
    }
}

/// Read the raw file text.
pub async fn read_raw(container: &Container) -> StoreResult<String> {
    tokio::fs::read_to_string(container.file_path())
        .await
        .map_err(|source| StoreError::Io {
            path: container.file_path().to_path_buf(),
            source,
        })
}

/// Compare the file's current attributes against the container's cache.
/// Returns false (skip the reload) when nothing changed or the file cannot
/// be inspected.
pub async fn file_changed(container: &Container) -> bool {
    match tokio::fs::metadata(container.file_path()).await {
        Ok(meta) => container.observe_attrs(modified_ms(&meta), meta.len()),
        Err(error) => {
            tracing::error!(
                path = %container.file_path().display(),
                %error,
                "failed to inspect config file attributes"
            );
            false
        }
    }
}

/// Re-read the file's attributes into the container cache, unconditionally.
pub async fn refresh_attrs(container: &Container) {
    match tokio::fs::metadata(container.file_path()).await {
        Ok(meta) => container.record_attrs(modified_ms(&meta), meta.len()),
        Err(error) => {
            tracing::warn!(
                path = %container.file_path().display(),
                %error,
                "failed to refresh config file attributes"
            );
        }
    }
}

fn modified_ms(meta: &std::fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
