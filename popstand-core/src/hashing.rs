//! Hashing - SHA-256 Fingerprints
//!
//! Structurally equal values hash identically, so a fingerprint is a safe
//! memoization key for scene graphs and contracts.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

use crate::spec::Spec;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Hash of any serializable record in canonical form.
pub fn compute_manifest_hash<T: Serialize>(manifest: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(manifest)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Memoization key for everything derived from `spec`.
pub fn spec_fingerprint(spec: &Spec) -> Result<String, serde_json::Error> {
    compute_manifest_hash(spec)
}

/// job_hash = sha256(spec_hash + canonical_payload + engine_version)
pub fn compute_job_hash(
    spec_hash: &str,
    payload: &impl Serialize,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let canonical_payload = canonical_json(payload)?;
    let combined = format!("{}:{}:{}", spec_hash, canonical_payload, engine_version);
    Ok(sha256_hex(combined.as_bytes()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
