//! Canonical JSON – ports the root crate's stable-key serialisation so every
//! hash the engine takes (state snapshots, step fingerprints, fault
//! signatures) is reproducible byte-for-byte across runs.
//!
//! Notes:
//! - Object keys are sorted (BTreeMap); array order is preserved as-is.
//! - Uses serde_json's default number formatting; NaN/Inf must not appear in
//!   engine JSON.

use serde_json::Value;
use std::collections::BTreeMap;

pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => serde_json::to_string(s).unwrap(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(map) => {
            let mut tree = BTreeMap::new();
            for (k, v) in map {
                tree.insert(k, to_canonical_json(v));
            }
            let items: Vec<String> = tree
                .into_iter()
                .map(|(k, v)| format!("{}:{}", serde_json::to_string(&k).unwrap(), v))
                .collect();
            format!("{{{}}}", items.join(","))
        }
    }
}
