//! calc-compare - regression diff tool for calculation APIs
//!
//! Replays every case of a CSV batch against a reference server (A) and a
//! candidate server (B), strips volatile fields from both JSON responses and
//! reports the cases whose responses differ.
//!
//! ## Usage
//!
//! ```bash
//! # Compare two deployments; the report lands in cases-out.csv
//! calc-compare cases.csv https://prod/calctaxes https://staging/calctaxes
//!
//! # Dispatch 8 cases at once and keep going past failing cases
//! calc-compare cases.csv $A $B --concurrency 8 --keep-going
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, Level};

mod cli;
mod compare;
mod config;
mod error;
mod executor;
mod http;
mod input;
mod models;
mod output;
mod utils;

use cli::Args;
use compare::Normalizer;
use config::{AppConfig, EnvConfig};
use executor::{ComparisonRunner, Endpoints};
use http::EndpointClient;
use output::{derive_output_path, ReportWriter};
use utils::init_logger;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.log_level()
    };
    init_logger(level);
    debug!("Effective configuration: {:?}", config);

    let cases = input::load_cases(&args.input)?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| derive_output_path(&args.input));
    let report = ReportWriter::create(&output_path)?;
    info!("Report: {}", output_path.display());

    let client = EndpointClient::builder()
        .timeout(config.timeout())
        .accept_invalid_certs(config.accept_invalid_certs)
        .build()?;

    let normalizer = Normalizer::with_fields(config.ignored_fields.clone());
    debug!("Ignoring response fields: {:?}", normalizer.ignored_fields());

    let mut runner = ComparisonRunner::new(client, Endpoints::new(&args.server_a, &args.server_b))
        .with_normalizer(normalizer)
        .with_concurrency(config.concurrency())
        .with_failure_policy(config.failure_policy());

    let mut stdout = std::io::stdout();
    let result = runner.run(cases, report, &mut stdout).await;
    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            error!("Run stopped in {:?} state: {}", runner.state(), e);
            return Err(e.into());
        }
    };
    debug!(
        "Run summary: {}",
        serde_json::to_string(&summary).context("Failed to serialize run summary")?
    );

    Ok(())
}

/// Merge defaults, config file, environment and CLI flags
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let env = EnvConfig::load();

    let config_path = args
        .config
        .clone()
        .or_else(|| env.config_file.as_ref().map(Into::into));
    let mut config = AppConfig::load_or_default(config_path.as_deref())?;
    config.apply_env(&env);

    if let Some(timeout) = args.timeout {
        config.timeout_secs = Some(timeout);
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if args.keep_going {
        config.keep_going = true;
    }
    if args.insecure {
        config.accept_invalid_certs = true;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    Ok(config)
}
