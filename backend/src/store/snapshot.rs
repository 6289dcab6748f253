//! Store snapshots
//!
//! Serializable dump of an [`InMemoryStore`](super::InMemoryStore) with a
//! SHA-256 digest over its canonical JSON form. Two snapshots with the same
//! digest hold identical documents, which makes "did this operation change
//! anything?" a one-line comparison.

use super::{Collection, Fields, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Complete store contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Next insertion sequence to hand out after restore
    pub next_seq: u64,

    /// Documents per collection, in insertion order
    pub collections: BTreeMap<Collection, Vec<DocumentSnapshot>>,

    /// SHA-256 of the canonical JSON of `collections`
    pub digest: String,
}

/// One stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub id: String,
    pub seq: u64,
    pub fields: Fields,
}

impl StoreSnapshot {
    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string(self)
            .map_err(|e| StoreError::Serialization(format!("Snapshot serialization failed: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json)
            .map_err(|e| StoreError::Serialization(format!("Snapshot parse failed: {}", e)))
    }

    /// Documents of one collection
    pub fn documents(&self, collection: Collection) -> &[DocumentSnapshot] {
        self.collections
            .get(&collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Deterministic SHA-256 of any serializable value
///
/// Object keys are sorted recursively before hashing so the digest does not
/// depend on map iteration order.
pub fn compute_digest<T: Serialize>(value: &T) -> Result<String, StoreError> {
    let value = serde_json::to_value(value)
        .map_err(|e| StoreError::Serialization(format!("Digest serialization failed: {}", e)))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| StoreError::Serialization(format!("Digest serialization failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_digest_ignores_key_order() {
        let a = json!({"b": 1, "a": {"y": 2, "x": 3}});
        let b = json!({"a": {"x": 3, "y": 2}, "b": 1});
        assert_eq!(compute_digest(&a).unwrap(), compute_digest(&b).unwrap());
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = compute_digest(&json!({})).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
