//! Structural deep merge for schema migration.
//!
//! # Responsibilities
//! - Reconcile a previously persisted value with a newer default
//! - Preserve user-set values for keys that still exist
//! - Let newly introduced keys keep their default values
//! - Stamp the target schema version on the result
//!
//! # Design Decisions
//! - Scalars and arrays are taken wholesale from the old value; nested
//!   objects are merged key by key
//! - On a type mismatch the old raw value wins opaquely; no coercion
//! - The reserved top-level `version` key never participates in the merge

use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// Outcome of a migration merge: the merged value plus which top-level
/// fields were carried over from the old file and which were newly
/// introduced from the default.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub value: Value,
    pub preserved: BTreeSet<String>,
    pub introduced: BTreeSet<String>,
}

/// Deep-merge `old` into `new`, preferring old values for keys that exist
/// in both. Keys present only in `new` keep their values; keys present
/// only in `old` are dropped (the schema no longer has them). The
/// top-level `version` key is excluded and must be stamped by the caller.
pub fn deep_merge(old: &Value, new: &Value) -> Value {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            Value::Object(merge_objects(old_map, new_map, true))
        }
        // Type mismatch at the root: the old raw value wins opaquely.
        _ => old.clone(),
    }
}

fn merge_objects(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    skip_version: bool,
) -> Map<String, Value> {
    let mut out = new.clone();
    for (key, old_value) in old {
        if skip_version && key == "version" {
            continue;
        }
        if let Some(new_value) = new.get(key) {
            let merged = match (old_value, new_value) {
                (Value::Object(old_inner), Value::Object(new_inner)) => {
                    Value::Object(merge_objects(old_inner, new_inner, false))
                }
                _ => old_value.clone(),
            };
            out.insert(key.clone(), merged);
        }
    }
    out
}

/// Run the full migration chain for a container: the on-disk (old-version)
/// value, the current in-memory value, and the registered default are
/// reconciled in that order, then the target version is stamped.
pub fn migrate(
    on_disk: &Value,
    in_memory: &Value,
    default: &Value,
    target_version: &str,
) -> MigrationOutcome {
    let mut merged = deep_merge(&deep_merge(on_disk, in_memory), default);
    if let Value::Object(map) = &mut merged {
        map.insert(
            "version".to_string(),
            Value::String(target_version.to_string()),
        );
    }

    let mut preserved = BTreeSet::new();
    let mut introduced = BTreeSet::new();
    if let (Value::Object(default_map), Value::Object(old_map)) = (default, on_disk) {
        for key in default_map.keys() {
            if key == "version" {
                continue;
            }
            if old_map.contains_key(key) {
                preserved.insert(key.clone());
            } else {
                introduced.insert(key.clone());
            }
        }
    }

    MigrationOutcome {
        value: merged,
        preserved,
        introduced,
    }
}
