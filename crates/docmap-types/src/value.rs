//! Canonical string rendering of document values.
//!
//! Identity digests are computed over the string form of field values, so
//! that form must be byte-stable across platforms and process restarts.
//! Default `Debug`/locale-sensitive formatting is not; this module pins one
//! canonical rendering for every value shape:
//!
//! - `null` renders as `null`, booleans as `true`/`false`
//! - integers render in plain decimal
//! - floats use Rust's shortest-roundtrip `Display`, with `.0` forced onto
//!   integral values so `1` the float never collides with `1` the integer
//! - strings render verbatim (no quoting)
//! - arrays and objects render as compact JSON with object keys sorted
//! - timestamps are carried as RFC 3339 strings and render verbatim

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Render a value into its canonical hash-input string.
pub fn canonical_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => canonical_number(n),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => canonical_json(value),
    }
}

fn canonical_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    // f64 Display is shortest-roundtrip and platform-independent; integral
    // values get an explicit fraction so they stay distinct from integers.
    let f = n.as_f64().unwrap_or(f64::NAN);
    if f.is_finite() && f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// Compact JSON with object keys sorted recursively.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", inner.join(","))
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let inner: Vec<String> = keys
                .iter()
                .map(|k| {
                    let key = serde_json::to_string(k).unwrap_or_default();
                    format!("{key}:{}", canonical_json(&map[*k]))
                })
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        Value::String(s) => serde_json::to_string(s).unwrap_or_default(),
        Value::Number(n) => canonical_number(n),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    }
}

/// Borrow the value at a dotted path inside a nested object, if present.
pub fn dotted_get<'a>(map: &'a serde_json::Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = map.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Canonical timestamp rendering: RFC 3339 UTC with millisecond precision.
///
/// All timestamps stored by docmap pass through this before hashing or
/// persistence, so round trips compare equal field-for-field.
pub fn canonical_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
