//! Field readers shared by the decoders.

use serde_json::{Map, Value};

use relay_common::types::SkipReason;

/// Read a required non-empty field. Numbers are accepted and stringified,
/// since chat ids are often produced as integers.
pub(crate) fn required(
    payload: &Map<String, Value>,
    key: &'static str,
) -> Result<String, SkipReason> {
    optional(payload, key).ok_or(SkipReason::MissingField(key))
}

/// Read an optional field; null, empty strings and non-scalar values count as absent.
pub(crate) fn optional(payload: &Map<String, Value>, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
