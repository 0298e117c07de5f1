//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "CALC_COMPARE";

/// Overrides read from `CALC_COMPARE_*` variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Timeout from CALC_COMPARE_TIMEOUT
    pub timeout: Option<u64>,
    /// Concurrency from CALC_COMPARE_CONCURRENCY
    pub concurrency: Option<usize>,
    /// Keep-going from CALC_COMPARE_KEEP_GOING
    pub keep_going: Option<bool>,
    /// Log level from CALC_COMPARE_LOG_LEVEL
    pub log_level: Option<String>,
    /// Config file from CALC_COMPARE_CONFIG
    pub config_file: Option<String>,
    /// Invalid certificate acceptance from CALC_COMPARE_INSECURE
    pub insecure: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load using a custom variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}"));

        Self {
            timeout: get("TIMEOUT").and_then(|v| v.parse().ok()),
            concurrency: get("CONCURRENCY").and_then(|v| v.parse().ok()),
            keep_going: get("KEEP_GOING").map(|v| parse_bool(&v)),
            log_level: get("LOG_LEVEL"),
            config_file: get("CONFIG"),
            insecure: get("INSECURE").map(|v| parse_bool(&v)),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let env = EnvConfig::from_lookup(lookup(&[
            ("CALC_COMPARE_TIMEOUT", "15"),
            ("CALC_COMPARE_CONCURRENCY", "3"),
            ("CALC_COMPARE_KEEP_GOING", "yes"),
            ("CALC_COMPARE_LOG_LEVEL", "debug"),
        ]));

        assert_eq!(env.timeout, Some(15));
        assert_eq!(env.concurrency, Some(3));
        assert_eq!(env.keep_going, Some(true));
        assert_eq!(env.log_level.as_deref(), Some("debug"));
        assert_eq!(env.insecure, None);
    }

    #[test]
    fn test_unparseable_values_ignored() {
        let env = EnvConfig::from_lookup(lookup(&[("CALC_COMPARE_TIMEOUT", "soon")]));
        assert_eq!(env.timeout, None);
        assert_eq!(env.concurrency, None);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("off"));
    }
}
