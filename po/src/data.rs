//! JSON data sources
//!
//! Nested objects flatten into upper-cased, underscore-joined keys:
//! `{"a": {"b": 1}}` becomes `A_B = "1"`.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

/// Flatten a JSON value into `out`
///
/// Only objects are walked. Leaves render as plain text for strings and as
/// compact JSON for everything else (numbers, booleans, null, arrays). A
/// non-object root contributes nothing.
pub fn flatten_json(value: &Value, out: &mut BTreeMap<String, String>) {
    debug!("flatten_json: called");
    if let Value::Object(map) = value {
        flatten_into(map, "", out);
    } else {
        debug!("flatten_json: root is not an object, nothing to flatten");
    }
}

fn flatten_into(map: &serde_json::Map<String, Value>, prefix: &str, out: &mut BTreeMap<String, String>) {
    for (key, value) in map {
        let full_key = if prefix.is_empty() {
            key.to_uppercase()
        } else {
            format!("{}_{}", prefix, key).to_uppercase()
        };

        match value {
            Value::Object(nested) => flatten_into(nested, &full_key, out),
            Value::String(s) => {
                out.insert(full_key, s.clone());
            }
            other => {
                out.insert(full_key, other.to_string());
            }
        }
    }
}

/// Key under which a whole JSON file is kept: the file stem, upper-cased,
/// with `-` and spaces turned into `_`
pub fn data_source_key(path: &Path) -> String {
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    stem.to_uppercase().replace(['-', ' '], "_")
}
