//! Declarative field schemas for inbound messages.
//!
//! Serde alone reports a missing nested field without saying where it lives,
//! so envelopes are checked against a static field table first. Only exact
//! JSON types are accepted: an integer field never takes a numeric string.

use serde_json::{Map, Value};

use crate::error::ValidationFailure;
use crate::protocol::envelope::describe;

/// Primitive or nested type of one field.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    Int,
    Str,
    /// Free-form mapping (not validated further).
    Map,
    /// Nested record validated recursively.
    Record(&'static [Field]),
}

impl FieldType {
    fn expected(&self) -> &'static str {
        match self {
            FieldType::Int => "integer",
            FieldType::Str => "string",
            FieldType::Map | FieldType::Record(_) => "mapping",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
}

impl Field {
    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty, required: true }
    }

    /// Optional fields may be absent or `null`.
    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty, required: false }
    }
}

/// Validate `obj` against `fields`, reporting the first mismatch.
pub fn validate(obj: &Map<String, Value>, fields: &[Field]) -> Result<(), ValidationFailure> {
    validate_at(obj, fields, "")
}

fn validate_at(
    obj: &Map<String, Value>,
    fields: &[Field],
    prefix: &str,
) -> Result<(), ValidationFailure> {
    for field in fields {
        let path = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };

        let value = match obj.get(field.name) {
            None | Some(Value::Null) if !field.required => continue,
            None => return Err(ValidationFailure::new(path, "missing field")),
            Some(v) => v,
        };

        let ok = match (field.ty, value) {
            (FieldType::Int, Value::Number(n)) => n.is_i64(),
            (FieldType::Str, Value::String(_)) => true,
            (FieldType::Map, Value::Object(_)) => true,
            (FieldType::Record(nested), Value::Object(inner)) => {
                validate_at(inner, nested, &path)?;
                true
            }
            _ => false,
        };

        if !ok {
            return Err(ValidationFailure::new(
                path,
                format!("expected {}, found {}", field.ty.expected(), describe(value)),
            ));
        }
    }
    Ok(())
}
