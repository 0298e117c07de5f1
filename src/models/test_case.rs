//! Test case and response document models

use serde_json::Value;

/// One row of the input batch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    /// Case identifier (first column)
    pub id: String,

    /// Request payload, sent verbatim
    pub input: String,

    /// Expected result column. Loaded but never consulted.
    #[allow(dead_code)]
    pub expected: String,
}

impl TestCase {
    pub fn new(
        id: impl Into<String>,
        input: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            input: input.into(),
            expected: expected.into(),
        }
    }
}

/// Raw body returned by an endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub url: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }
}

/// JSON response with the volatile top-level keys removed
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedDocument(Value);

impl NormalizedDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Canonical serialized form. Object keys come out sorted.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // Serializing an in-memory Value cannot fail
        serde_json::to_vec(&self.0).unwrap_or_default()
    }
}
