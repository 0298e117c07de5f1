//! Comparison outcomes and run summary models

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::error::CompareError;

/// Result of diffing two normalized documents
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComparisonResult {
    Match,
    /// Human-readable rendering of the differences
    Divergent(String),
}

impl ComparisonResult {
    #[cfg(test)]
    pub fn is_match(&self) -> bool {
        matches!(self, ComparisonResult::Match)
    }

    pub fn diff_text(&self) -> Option<&str> {
        match self {
            ComparisonResult::Match => None,
            ComparisonResult::Divergent(text) => Some(text),
        }
    }
}

/// Verdict reported per case in the operational log
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Ok,
    Divergent,
    Error,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ok => write!(f, "ok"),
            Verdict::Divergent => write!(f, "divergent"),
            Verdict::Error => write!(f, "error"),
        }
    }
}

/// Tagged outcome of one case
#[derive(Debug)]
pub enum CaseOutcome {
    Compared {
        case_id: String,
        result: ComparisonResult,
    },
    Failed {
        case_id: String,
        error: CompareError,
    },
}

impl CaseOutcome {
    pub fn case_id(&self) -> &str {
        match self {
            CaseOutcome::Compared { case_id, .. } | CaseOutcome::Failed { case_id, .. } => case_id,
        }
    }

    pub fn verdict(&self) -> Verdict {
        match self {
            CaseOutcome::Compared {
                result: ComparisonResult::Match,
                ..
            } => Verdict::Ok,
            CaseOutcome::Compared { .. } => Verdict::Divergent,
            CaseOutcome::Failed { .. } => Verdict::Error,
        }
    }

    /// Operational log line for this case
    pub fn log_line(&self) -> String {
        format!("Test ID: {}, {}", self.case_id(), self.verdict())
    }
}

/// Summary of a finished run
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub matched: usize,
    pub divergent: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Elapsed time as written to the END row
    pub elapsed_display: String,
    /// (case id, verdict) in input order
    pub verdicts: Vec<(String, Verdict)>,
}
