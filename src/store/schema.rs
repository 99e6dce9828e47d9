//! Explicit schema descriptors for typed binding.
//!
//! # Responsibilities
//! - Describe a config's top-level fields (name, kind, default)
//! - Strict-bind a structural value against that description
//!
//! # Design Decisions
//! - Derived from the registered default value, not declared separately
//! - `bind` is a pure function and returns all mismatches, not just the
//!   first
//! - A failed bind after a best-effort merge is reported, not fatal; the
//!   merged value stays authoritative

use std::fmt;

use serde_json::Value;

/// The structural kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Array,
    Object,
}

impl FieldKind {
    /// Kind of a structural value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => FieldKind::Null,
            Value::Bool(_) => FieldKind::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => FieldKind::Integer,
            Value::Number(_) => FieldKind::Float,
            Value::String(_) => FieldKind::String,
            Value::Array(_) => FieldKind::Array,
            Value::Object(_) => FieldKind::Object,
        }
    }

    fn name(self) -> &'static str {
        match self {
            FieldKind::Null => "null",
            FieldKind::Bool => "bool",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::String => "string",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
        }
    }

    /// Whether a value of `found` kind satisfies this expected kind.
    /// Integers satisfy float fields; a null-defaulted field accepts
    /// anything.
    fn accepts(self, found: FieldKind) -> bool {
        match self {
            FieldKind::Null => true,
            FieldKind::Float => matches!(found, FieldKind::Float | FieldKind::Integer),
            expected => expected == found,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One top-level field of a schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub default: Value,
}

/// A mismatch found while binding a value against a schema.
#[derive(Debug, Clone)]
pub struct BindError {
    pub field: String,
    pub expected: FieldKind,
    /// `None` when the field is missing entirely.
    pub found: Option<FieldKind>,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.found {
            Some(found) => write!(
                f,
                "field {:?} expected {} but found {}",
                self.field, self.expected, found
            ),
            None => write!(f, "field {:?} ({}) is missing", self.field, self.expected),
        }
    }
}

/// Field-level description of one config id's schema.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    pub config_id: String,
    pub version: String,
    pub fields: Vec<FieldSpec>,
}

impl SchemaDescriptor {
    /// Derive a schema from a default value. Non-object defaults yield an
    /// empty field list.
    pub fn from_default(config_id: &str, version: &str, default: &Value) -> Self {
        let fields = match default {
            Value::Object(map) => map
                .iter()
                .map(|(name, value)| FieldSpec {
                    name: name.clone(),
                    kind: FieldKind::of(value),
                    default: value.clone(),
                })
                .collect(),
            _ => Vec::new(),
        };
        Self {
            config_id: config_id.to_string(),
            version: version.to_string(),
            fields,
        }
    }

    /// Rebuild the default value described by this schema.
    pub fn default_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        for field in &self.fields {
            map.insert(field.name.clone(), field.default.clone());
        }
        Value::Object(map)
    }

    /// Strict-bind `value` against this schema. Every missing field and
    /// every kind mismatch is reported. Fields not described by the schema
    /// are ignored.
    pub fn bind(&self, value: &Value) -> Result<(), Vec<BindError>> {
        let map = match value {
            Value::Object(map) => map,
            _ => {
                return Err(vec![BindError {
                    field: String::new(),
                    expected: FieldKind::Object,
                    found: Some(FieldKind::of(value)),
                }])
            }
        };

        let mut errors = Vec::new();
        for field in &self.fields {
            match map.get(&field.name) {
                None => errors.push(BindError {
                    field: field.name.clone(),
                    expected: field.kind,
                    found: None,
                }),
                Some(found) => {
                    let found_kind = FieldKind::of(found);
                    if !field.kind.accepts(found_kind) {
                        errors.push(BindError {
                            field: field.name.clone(),
                            expected: field.kind,
                            found: Some(found_kind),
                        });
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
