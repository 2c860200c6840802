//! Snapshot payload checksums
//!
//! The payload is canonicalized (object keys sorted, no whitespace) before
//! hashing so a snapshot re-serialized by another tool still verifies.

use crate::domain::{MigrateError, Result};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Hex-encoded SHA-256 of the canonical JSON form of `data`
pub fn payload_checksum<T: Serialize>(data: &T) -> Result<String> {
    let value = serde_json::to_value(data)
        .map_err(|e| MigrateError::Serialization(format!("failed to encode payload: {e}")))?;
    checksum_value(&value)
}

/// Hex-encoded SHA-256 of a JSON value after key normalization
pub fn checksum_value(value: &Value) -> Result<String> {
    let canonical = serde_json::to_string(&normalize_json(value))?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

fn normalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, normalize_json(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize_json).collect()),
        other => other.clone(),
    }
}
