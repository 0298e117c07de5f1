//! Error types for a comparison run
//!
//! Every variant is fatal under the default fail-fast policy.

use std::path::PathBuf;
use thiserror::Error;

/// Comparison pipeline errors
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed input file: {0}")]
    Parse(String),

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Service {url} did not return a status code 200 OK: {status}")]
    UnexpectedStatus { url: String, status: String },

    #[error("Response from {url} is not valid JSON: {source}")]
    MalformedJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write report: {0}")]
    Report(#[from] csv::Error),

    #[error("Failed to write operational log: {0}")]
    Log(#[source] std::io::Error),
}

impl CompareError {
    /// Short tag used in the operational log and report rows
    pub fn kind(&self) -> &'static str {
        match self {
            CompareError::Io { .. } => "io",
            CompareError::Parse(_) => "parse",
            CompareError::Transport { .. } => "transport",
            CompareError::UnexpectedStatus { .. } => "status",
            CompareError::MalformedJson { .. } => "json",
            CompareError::Report(_) => "report",
            CompareError::Log(_) => "log",
        }
    }
}

pub type CompareResult<T> = std::result::Result<T, CompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CompareError::UnexpectedStatus {
            url: "http://a/calc".to_string(),
            status: "500 Internal Server Error".to_string(),
        };
        assert!(err.to_string().contains("500 Internal Server Error"));
        assert_eq!(err.kind(), "status");

        let err = CompareError::Parse("row 3 has 2 columns".to_string());
        assert_eq!(err.to_string(), "Malformed input file: row 3 has 2 columns");
    }
}
