//! Report output module
//!
//! Writes the divergence report and derives its location from the input path.

mod report;

pub use report::{derive_output_path, ReportWriter};
