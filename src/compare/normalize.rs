//! Response normalizer
//!
//! Strips top-level keys whose values legitimately differ between servers
//! (timestamps, logs). Nested objects are left alone, as are non-object
//! documents.

use serde_json::Value;
use tracing::trace;

use crate::error::{CompareError, CompareResult};
use crate::models::{NormalizedDocument, RawResponse};

/// Keys removed from every response before comparison
pub const VOLATILE_FIELDS: &[&str] = &["dtES", "dtEmissao", "dtPagto", "log"];

/// Removes volatile keys from response documents
#[derive(Clone, Debug)]
pub struct Normalizer {
    ignored_fields: Vec<String>,
}

impl Normalizer {
    /// Normalizer for the default volatile key set
    pub fn new() -> Self {
        Self::with_fields(VOLATILE_FIELDS.iter().copied())
    }

    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ignored_fields(&self) -> &[String] {
        &self.ignored_fields
    }

    /// Parse a raw response and strip the ignored keys
    pub fn normalize(&self, raw: &RawResponse) -> CompareResult<NormalizedDocument> {
        let value: Value =
            serde_json::from_slice(&raw.body).map_err(|source| CompareError::MalformedJson {
                url: raw.url.clone(),
                source,
            })?;

        Ok(self.normalize_value(value))
    }

    /// Strip the ignored keys from an already parsed document
    pub fn normalize_value(&self, mut value: Value) -> NormalizedDocument {
        if let Value::Object(map) = &mut value {
            for field in &self.ignored_fields {
                if map.remove(field).is_some() {
                    trace!("Removed volatile field {}", field);
                }
            }
        }

        NormalizedDocument::new(value)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}
