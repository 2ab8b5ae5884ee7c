//! Recursive merge for the dynamic JSON context tree.

use serde_json::{Map, Value};
use thiserror::Error;

/// Merge errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// An object and an array met at the same path.
    #[error("cannot merge {overlay} into {base} at `{path}`")]
    ShapeMismatch {
        path: String,
        base: &'static str,
        overlay: &'static str,
    },

    /// The overlay root is not an object.
    #[error("override data must be an object, got {0}")]
    NotAnObject(&'static str),
}

/// Short name of a JSON value's kind, for error messages.
#[must_use]
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Deep-merge `overlay` into `base`.
///
/// Objects merge key by key; any other overlay value replaces the base
/// value at the same path. An object meeting an array is an error, and
/// `base` may be partially updated when that happens.
pub fn deep_merge(
    base: &mut Map<String, Value>,
    overlay: Map<String, Value>,
) -> Result<(), MergeError> {
    merge_at(base, overlay, "")
}

/// Deep-merge an arbitrary overlay value, which must be an object or null.
pub fn deep_merge_value(base: &mut Map<String, Value>, overlay: Value) -> Result<(), MergeError> {
    match overlay {
        Value::Null => Ok(()),
        Value::Object(map) => deep_merge(base, map),
        other => Err(MergeError::NotAnObject(kind_name(&other))),
    }
}

fn merge_at(
    base: &mut Map<String, Value>,
    overlay: Map<String, Value>,
    prefix: &str,
) -> Result<(), MergeError> {
    for (key, incoming) in overlay {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match incoming {
            Value::Object(incoming) => match base.get_mut(&key) {
                Some(Value::Object(existing)) => merge_at(existing, incoming, &path)?,
                Some(Value::Array(_)) => return Err(mismatch(path, "array", "object")),
                _ => {
                    base.insert(key, Value::Object(incoming));
                }
            },
            Value::Array(items) => {
                if matches!(base.get(&key), Some(Value::Object(_))) {
                    return Err(mismatch(path, "object", "array"));
                }
                base.insert(key, Value::Array(items));
            }
            scalar => {
                base.insert(key, scalar);
            }
        }
    }
    Ok(())
}

fn mismatch(path: String, base: &'static str, overlay: &'static str) -> MergeError {
    MergeError::ShapeMismatch {
        path,
        base,
        overlay,
    }
}
