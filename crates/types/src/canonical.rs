//! Canonical JSON rendering used for transaction hashing and signing.
//!
//! Object keys are sorted at every depth and no whitespace is emitted, so two
//! structurally equal documents always produce the same bytes regardless of
//! how their maps were built.

use serde_json::Value;

/// Render `value` in canonical form.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

// Keys are sorted here rather than left to `serde_json::Map`: any crate in the
// build enabling serde_json's `preserve_order` feature turns the map into an
// insertion-ordered `IndexMap`, which would change transaction ids.
fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_string(s, out),
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_string(s: &str, out: &mut String) {
    // serde_json escapes quotes, backslashes and control characters only.
    out.push_str(&Value::String(s.to_owned()).to_string());
}
