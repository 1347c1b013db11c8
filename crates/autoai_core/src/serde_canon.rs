//! Canonical JSON serialization for deterministic artifacts
//!
//! Object keys are sorted recursively and no whitespace is emitted, so two
//! equal values always produce the same bytes and the same BLAKE3 digest.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::Result;

/// Serialize a value to canonical JSON (sorted keys, no whitespace)
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let json_value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&canonicalize_value(json_value))?)
}

/// Sort all object keys recursively
fn canonicalize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key, canonicalize_value(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize_value).collect()),
        other => other,
    }
}

/// BLAKE3 digest of raw bytes as lowercase hex
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// BLAKE3 digest of the canonical JSON form of `value`
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String> {
    Ok(digest_hex(to_canonical_json(value)?.as_bytes()))
}
