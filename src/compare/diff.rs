//! Structural JSON diff
//!
//! Objects compare regardless of key order, arrays element by element in
//! order. Numbers compare by value, so `1` and `1.0` are equal.
//!
//! Paths start at `$`. Plain keys are appended as `.key`; keys holding other
//! characters are quoted, as in `$["a.b"]`, so every path is unambiguous.

use serde_json::{Map, Number, Value};
use std::fmt;

use crate::models::{ComparisonResult, NormalizedDocument};

/// Kind of difference found at a path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DiffKind {
    /// Same type, different value
    Changed,
    /// Different JSON types
    TypeMismatch,
    /// Key or element present only in A
    MissingInB,
    /// Key or element present only in B
    ExtraInB,
    /// Arrays of different length
    Length,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffKind::Changed => write!(f, "CHANGED"),
            DiffKind::TypeMismatch => write!(f, "TYPE"),
            DiffKind::MissingInB => write!(f, "MISSING"),
            DiffKind::ExtraInB => write!(f, "EXTRA"),
            DiffKind::Length => write!(f, "LENGTH"),
        }
    }
}

/// A single difference between documents A and B
#[derive(Clone, Debug, PartialEq, Eq)]
struct Difference {
    kind: DiffKind,
    path: String,
    a: Option<String>,
    b: Option<String>,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.a.as_deref().unwrap_or("(absent)");
        let b = self.b.as_deref().unwrap_or("(absent)");
        write!(f, "[{}] {}: A={} B={}", self.kind, self.path, a, b)
    }
}

/// Compare two normalized documents
pub fn diff(a: &NormalizedDocument, b: &NormalizedDocument) -> ComparisonResult {
    if a.canonical_bytes() == b.canonical_bytes() {
        return ComparisonResult::Match;
    }

    let differences = diff_values(a.as_value(), b.as_value());

    if differences.is_empty() {
        ComparisonResult::Match
    } else {
        let text = differences
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        ComparisonResult::Divergent(text)
    }
}

/// List every difference between two JSON values
fn diff_values(a: &Value, b: &Value) -> Vec<Difference> {
    let mut differences = Vec::new();
    walk("$", a, b, &mut differences);
    differences
}

fn walk(path: &str, a: &Value, b: &Value, out: &mut Vec<Difference>) {
    match (a, b) {
        (Value::Object(a_obj), Value::Object(b_obj)) => walk_objects(path, a_obj, b_obj, out),
        (Value::Array(a_arr), Value::Array(b_arr)) => {
            if a_arr.len() != b_arr.len() {
                out.push(Difference {
                    kind: DiffKind::Length,
                    path: path.to_string(),
                    a: Some(a_arr.len().to_string()),
                    b: Some(b_arr.len().to_string()),
                });
            }

            for (i, (a_elem, b_elem)) in a_arr.iter().zip(b_arr.iter()).enumerate() {
                walk(&format!("{path}[{i}]"), a_elem, b_elem, out);
            }

            let common = a_arr.len().min(b_arr.len());
            for (i, a_elem) in a_arr.iter().enumerate().skip(common) {
                out.push(Difference {
                    kind: DiffKind::MissingInB,
                    path: format!("{path}[{i}]"),
                    a: Some(a_elem.to_string()),
                    b: None,
                });
            }
            for (i, b_elem) in b_arr.iter().enumerate().skip(common) {
                out.push(Difference {
                    kind: DiffKind::ExtraInB,
                    path: format!("{path}[{i}]"),
                    a: None,
                    b: Some(b_elem.to_string()),
                });
            }
        }
        (Value::Number(a_num), Value::Number(b_num)) => {
            if !numbers_equal(a_num, b_num) {
                out.push(changed(path, a, b));
            }
        }
        (Value::String(_), Value::String(_)) | (Value::Bool(_), Value::Bool(_)) => {
            if a != b {
                out.push(changed(path, a, b));
            }
        }
        (Value::Null, Value::Null) => {}
        _ => out.push(Difference {
            kind: DiffKind::TypeMismatch,
            path: path.to_string(),
            a: Some(a.to_string()),
            b: Some(b.to_string()),
        }),
    }
}

fn walk_objects(
    path: &str,
    a_obj: &Map<String, Value>,
    b_obj: &Map<String, Value>,
    out: &mut Vec<Difference>,
) {
    for (key, a_value) in a_obj {
        let key_path = key_path(path, key);
        match b_obj.get(key) {
            Some(b_value) => walk(&key_path, a_value, b_value, out),
            None => out.push(Difference {
                kind: DiffKind::MissingInB,
                path: key_path,
                a: Some(a_value.to_string()),
                b: None,
            }),
        }
    }

    for (key, b_value) in b_obj {
        if !a_obj.contains_key(key) {
            out.push(Difference {
                kind: DiffKind::ExtraInB,
                path: key_path(path, key),
                a: None,
                b: Some(b_value.to_string()),
            });
        }
    }
}

/// Path of `key` under `path`
fn key_path(path: &str, key: &str) -> String {
    let plain = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if plain {
        format!("{path}.{key}")
    } else {
        // The JSON string form escapes quotes and control characters
        format!("{path}[{}]", Value::String(key.to_string()))
    }
}

fn changed(path: &str, a: &Value, b: &Value) -> Difference {
    Difference {
        kind: DiffKind::Changed,
        path: path.to_string(),
        a: Some(a.to_string()),
        b: Some(b.to_string()),
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if a.is_f64() || b.is_f64() {
        return a.as_f64() == b.as_f64();
    }

    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => a.as_u64().is_some() && a.as_u64() == b.as_u64(),
    }
}
