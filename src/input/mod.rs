//! Input batch loading
//!
//! Reads the comma-separated case file into an ordered list of test cases.

mod loader;

pub use loader::load_cases;
