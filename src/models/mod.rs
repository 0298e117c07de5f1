//! Data models for a comparison run
//!
//! Test cases loaded from the input file and the outcomes produced per case.

mod outcome;
mod test_case;

pub use outcome::{CaseOutcome, ComparisonResult, RunSummary, Verdict};
pub use test_case::{NormalizedDocument, RawResponse, TestCase};
