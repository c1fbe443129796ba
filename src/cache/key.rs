//! Cache Key Module
//!
//! Derives canonical string keys from structured request values.

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

// == Cache Key ==
/// Canonical identity of a request.
///
/// Two requests whose fields hold the same values map to the same key, no
/// matter in which order the fields were built. Object fields are written in
/// sorted order. Sequences keep their order, so unordered collections must
/// serialize deterministically (`BTreeSet` rather than `HashSet`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    // == Derive ==
    /// Derives the key for `request`.
    ///
    /// Fails only if the request cannot be represented as JSON, for example
    /// a map keyed by something other than strings.
    pub fn derive<R>(request: &R) -> Result<Self, serde_json::Error>
    where
        R: Serialize + ?Sized,
    {
        let value = serde_json::to_value(request)?;

        let mut out = String::new();
        write_canonical(&value, &mut out);
        Ok(Self(out))
    }

    /// Wraps an already canonical string.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CacheKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// == Canonical Writer ==
/// Writes `value` as compact JSON with object keys sorted.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<(&String, &Value)> = map.iter().collect();
            fields.sort_unstable_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (name, field)) in fields.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(name, out);
                out.push(':');
                write_canonical(field, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_string(s, out),
        // Scalars already have a single compact form
        other => out.push_str(&other.to_string()),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push_str(&Value::from(s).to_string());
}
