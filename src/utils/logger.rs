//! Logging setup
//!
//! Diagnostics go through `tracing` to stderr. Stdout is left to the
//! per-case operational log.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Filter directive limiting diagnostics to this crate at `level`
fn filter_directive(level: Level) -> String {
    format!("calc_compare={}", level.as_str().to_lowercase())
}

/// Initialize the logger with specified level
pub fn init_logger(level: Level) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter_directive(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
