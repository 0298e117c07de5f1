//! Run timing
//!
//! Measures the wall-clock span of a comparison run.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Wall-clock timer started when a run enters its running state
#[derive(Debug)]
pub struct RunTimer {
    start: Instant,
    started_at: DateTime<Utc>,
}

impl RunTimer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer, returning the elapsed time and the finish timestamp
    pub fn stop(self) -> (Duration, DateTime<Utc>) {
        let elapsed = self.elapsed();
        tracing::debug!("Run finished after {}ms", elapsed.as_millis());
        (elapsed, Utc::now())
    }
}

/// Format a duration for the report, e.g. `812.4ms` or `3.201s`
pub fn format_duration(duration: Duration) -> String {
    format!("{duration:?}")
}
