//! Helpers for inspecting normalized payloads.

use serde_json::Value;

/// True when a payload carries no usable data.
///
/// `null`, empty strings, empty arrays and empty objects are empty. An object
/// whose only non-null member is `symbol` is also empty: normalizers always
/// stamp the symbol, so such an object means the upstream returned nothing.
#[must_use]
pub fn is_empty_payload(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(m) => m
            .iter()
            .filter(|(k, _)| k.as_str() != "symbol")
            .all(|(_, v)| v.is_null()),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
