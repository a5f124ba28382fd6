//! Hashing System - SHA-256 Fingerprints
//!
//! Input and table fingerprints let build tooling tell whether a
//! regeneration changed anything.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

use crate::resource::RawResource;
use crate::symbols::SymbolTable;

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
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Fingerprint of a compiled table
pub fn compute_table_hash(table: &SymbolTable) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(table)?.as_bytes()))
}

/// Fingerprint of a compile job, independent of the order resources
/// were scanned in.
/// input_hash = sha256(engine_version + canonical_settings + sorted canonical resources)
pub fn compute_input_hash(
    resources: &[RawResource],
    settings: &impl Serialize,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let mut encoded = resources
        .iter()
        .map(canonical_json)
        .collect::<Result<Vec<_>, _>>()?;
    encoded.sort();
    encoded.dedup();

    let combined = format!(
        "{}:{}:[{}]",
        engine_version,
        canonical_json(settings)?,
        encoded.join(",")
    );
    Ok(sha256_hex(combined.as_bytes()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": 3});
        assert_eq!(canonical_json(&obj).unwrap(), r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_input_hash_ignores_order() {
        let a = RawResource::file("doge.jpeg");
        let b = RawResource::file("tab_bar/tabbar_list.png");
        let settings = json!({"target": "objc"});

        let h1 = compute_input_hash(&[a.clone(), b.clone()], &settings, "1.0.0").unwrap();
        let h2 = compute_input_hash(&[b.clone(), a.clone()], &settings, "1.0.0").unwrap();
        assert_eq!(h1, h2);

        let h3 = compute_input_hash(&[a, b], &json!({"target": "swift"}), "1.0.0").unwrap();
        assert_ne!(h1, h3);
    }
}
