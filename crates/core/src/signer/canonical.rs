//! Canonical JSON rendering used as the signed payload.

use serde_json::{Map, Value};

/// Render a body as compact JSON with object keys sorted at every depth.
///
/// The transport sends exactly these bytes, so a verifier that re-serializes
/// the parsed body in received order rebuilds the same string.
pub fn canonical_body(body: &Value) -> String {
    sort_keys(body).to_string()
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
