//! Configuration module
//!
//! Settings come from defaults, an optional YAML/JSON file, `CALC_COMPARE_*`
//! environment variables and CLI flags, later sources winning.

mod env;

pub use env::EnvConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, Level};

use crate::compare::VOLATILE_FIELDS;
use crate::executor::FailurePolicy;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./calc-compare.yaml",
    "./.calc-compare.yaml",
    "~/.config/calc-compare/config.yaml",
];

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Request timeout in seconds. Unset waits indefinitely.
    pub timeout_secs: Option<u64>,

    /// Cases dispatched at once
    pub concurrency: usize,

    /// Record per-case failures instead of aborting the run
    pub keep_going: bool,

    /// Top-level response keys removed before comparison
    pub ignored_fields: Vec<String>,

    /// Accept invalid TLS certificates
    pub accept_invalid_certs: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            concurrency: 1,
            keep_going: false,
            ignored_fields: VOLATILE_FIELDS.iter().map(|f| f.to_string()).collect(),
            accept_invalid_certs: false,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Find a configuration file in the standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load from an explicit path, a standard location, or fall back to defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit.map(Path::to_path_buf).or_else(Self::find) {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(timeout) = env.timeout {
            self.timeout_secs = Some(timeout);
        }
        if let Some(concurrency) = env.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(keep_going) = env.keep_going {
            self.keep_going = keep_going;
        }
        if let Some(level) = &env.log_level {
            self.log_level = level.clone();
        }
        if let Some(insecure) = env.insecure {
            self.accept_invalid_certs = insecure;
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        if self.keep_going {
            FailurePolicy::KeepGoing
        } else {
            FailurePolicy::FailFast
        }
    }

    /// Diagnostic level. Unknown names fall back to `info`.
    pub fn log_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

/// Expand `~` to the home directory
fn expand_path(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
