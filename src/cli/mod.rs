//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::Parser;
use std::path::PathBuf;

/// Replay a batch of calculation requests against two servers and report divergent responses
#[derive(Parser, Debug)]
#[command(name = "calc-compare")]
#[command(version)]
#[command(about = "Compare JSON responses of two calculation servers for a batch of test cases")]
#[command(long_about = None)]
pub struct Args {
    /// Input CSV file (header row, then id,input,expected rows)
    pub input: PathBuf,

    /// Reference server URL (server A)
    pub server_a: String,

    /// Candidate server URL (server B)
    pub server_b: String,

    /// Report path (default: input path with .csv replaced by -out.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of cases dispatched at once
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Request timeout in seconds (default: wait indefinitely)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Record failing cases in the report instead of aborting the run
    #[arg(short, long)]
    pub keep_going: bool,

    /// Accept invalid TLS certificates
    #[arg(long)]
    pub insecure: bool,

    /// Configuration file (YAML or JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let args =
            Args::try_parse_from(["calc-compare", "cases.csv", "http://a/calc", "http://b/calc"])
                .unwrap();

        assert_eq!(args.input, PathBuf::from("cases.csv"));
        assert_eq!(args.server_a, "http://a/calc");
        assert_eq!(args.server_b, "http://b/calc");
        assert!(args.output.is_none());
        assert!(!args.keep_going);
    }

    #[test]
    fn test_missing_server_rejected() {
        assert!(Args::try_parse_from(["calc-compare", "cases.csv", "http://a"]).is_err());
    }

    #[test]
    fn test_options() {
        let args = Args::try_parse_from([
            "calc-compare",
            "cases.csv",
            "http://a",
            "http://b",
            "--concurrency",
            "4",
            "--timeout",
            "20",
            "--keep-going",
            "-o",
            "report.csv",
        ])
        .unwrap();

        assert_eq!(args.concurrency, Some(4));
        assert_eq!(args.timeout, Some(20));
        assert!(args.keep_going);
        assert_eq!(args.output, Some(PathBuf::from("report.csv")));
    }
}
