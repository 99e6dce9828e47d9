//! Reload, migration, and self-heal state machine.
//!
//! # States per pass
//! ```text
//! file missing      → seed the default to disk
//! attrs unchanged   → skip (duplicate notification or self-write)
//! empty / unparseable → self-heal: backup → restore → last-valid → default
//! version mismatch  → backup, three-way merge, persist merged
//! parsed            → adopt value, comments, hash
//! ```
//!
//! All mutation of a container routes through here (plus the explicit save
//! path), which is what serializes reloads per container.

use std::sync::Arc;

use serde_json::Value;

use crate::format::parser;
use crate::merge;
use crate::persistence::{backup, engine};
use crate::store::container::Container;
use crate::store::schema::SchemaDescriptor;
use crate::store::StoreContext;

/// Run one reload pass for a container.
pub(crate) async fn reload(ctx: &StoreContext, container: &Arc<Container>) {
    let path = container.file_path();

    match tokio::fs::try_exists(path).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(path = %path.display(), "config file missing, seeding default");
            engine::flush(container, &container.descriptor().default).await;
            return;
        }
        Err(error) => {
            tracing::error!(path = %path.display(), %error, "failed to check config file");
            return;
        }
    }

    if !engine::file_changed(container).await {
        tracing::trace!(path = %path.display(), "config file unchanged, skipping reload");
        return;
    }

    let raw = match engine::read_raw(container).await {
        Ok(raw) => raw,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "config read failed");
            self_heal(ctx, container, "reload_error").await;
            return;
        }
    };

    if raw.trim().is_empty() {
        self_heal(ctx, container, "empty_file").await;
        return;
    }

    let doc = parser::parse_with_comments(&raw);
    if doc.content.is_empty() {
        self_heal(ctx, container, "parse_error").await;
        return;
    }

    let parsed: Value = match serde_json::from_str(&doc.content) {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "config failed structural parse");
            self_heal(ctx, container, "json_error").await;
            return;
        }
    };

    container.replace_comments(doc.comments);

    let expected = container.descriptor().version.as_str();
    let found = parsed.get("version").and_then(Value::as_str);
    if found == Some(expected) {
        container.mark_saved(&parsed);
        container.adopt(parsed);
        tracing::info!(path = %path.display(), "config reloaded");
    } else {
        tracing::info!(
            path = %path.display(),
            found = found.unwrap_or("<none>"),
            expected,
            "config version mismatch, migrating"
        );
        migrate(ctx, container, parsed).await;
    }
}

/// Version-mismatch path: snapshot the old file, reconcile on-disk state,
/// in-memory state, and the registered default, then persist and adopt the
/// merged result.
async fn migrate(ctx: &StoreContext, container: &Arc<Container>, on_disk: Value) {
    backup::create_backup(container, &ctx.backup_dir, "pre_migration").await;

    let descriptor = container.descriptor();
    let outcome = merge::migrate(
        &on_disk,
        &container.current(),
        &descriptor.default,
        &descriptor.version,
    );

    // Best effort: a merge across a type-changing schema bump can produce a
    // value that no longer binds. Report it; the merged value still wins.
    let schema = SchemaDescriptor::from_default(
        &descriptor.config_id,
        &descriptor.version,
        &descriptor.default,
    );
    if let Err(errors) = schema.bind(&outcome.value) {
        for error in &errors {
            tracing::warn!(path = %container.file_path().display(), %error, "migrated value does not bind");
        }
    }

    tracing::info!(
        path = %container.file_path().display(),
        preserved = outcome.preserved.len(),
        introduced = outcome.introduced.len(),
        "config migrated"
    );

    container.adopt(outcome.value.clone());
    engine::flush(container, &outcome.value).await;
}

/// Recovery ladder for an unusable file: back it up under the failure
/// reason, then adopt and re-persist the first of: newest parseable
/// backup, last-known-good value, registered default. A pass always ends
/// with a valid in-memory value and a persisted file.
async fn self_heal(ctx: &StoreContext, container: &Arc<Container>, reason: &str) {
    tracing::warn!(
        path = %container.file_path().display(),
        reason,
        "config file unusable, starting recovery"
    );

    backup::create_backup(container, &ctx.backup_dir, reason).await;

    if let Some(restored) = backup::restore_latest(container, &ctx.backup_dir).await {
        container.adopt(restored.clone());
        engine::flush(container, &restored).await;
        return;
    }

    let last_valid = container.last_valid();
    let default = &container.descriptor().default;
    if *last_valid != *default {
        tracing::info!(
            path = %container.file_path().display(),
            "falling back to last known good value"
        );
        container.set_current((*last_valid).clone());
        engine::flush(container, &last_valid).await;
    } else {
        tracing::info!(
            path = %container.file_path().display(),
            "falling back to registered default"
        );
        container.set_current(default.clone());
        engine::flush(container, default).await;
    }
}
