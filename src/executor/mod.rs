//! Comparison execution engine
//!
//! Runs a batch of cases against two endpoints and aggregates the report.

mod runner;

pub use runner::{ComparisonRunner, Endpoints, FailurePolicy};
