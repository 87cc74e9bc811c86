//! Run command implementation
//!
//! This module implements the `run` command: connect to the WebDriver
//! endpoint, drive every configured query, and consolidate the exports.

use crate::adapters::automation::{Automation, WebDriverAutomation};
use crate::cli::restrict_queries;
use crate::config::{load_config, CheckpointMode, HarvestConfig};
use crate::core::checkpoint::signal_for;
use crate::core::run::{DatasetTier, QueryOutcome, RunCoordinator, RunSummary};
use crate::domain::HarvestError;
use crate::log_error_with_context;
use clap::Args;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Only run these states (comma-separated, must be configured)
    #[arg(long)]
    pub state: Option<String>,

    /// Override checkpoint mode (prompt, file or none)
    #[arg(long, value_name = "MODE")]
    pub checkpoints: Option<String>,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        if let Some(states) = &self.state {
            if let Err(e) = restrict_queries(&mut config.queries, states) {
                eprintln!("Invalid --state: {e}");
                return Ok(2);
            }
        }

        if let Some(mode) = &self.checkpoints {
            match CheckpointMode::from_str(mode) {
                Ok(mode) => {
                    tracing::info!(mode = ?mode, "Overriding checkpoint mode from CLI");
                    config.checkpoints.mode = mode;
                }
                Err(e) => {
                    eprintln!("{e}");
                    return Ok(2);
                }
            }
        }

        if !self.yes && !Self::confirm(&config)? {
            println!("Run cancelled.");
            return Ok(0);
        }

        tracing::info!("Connecting to WebDriver");
        let driver =
            match WebDriverAutomation::connect(&config.webdriver, &config.download.directory).await
            {
                Ok(d) => d,
                Err(e) => {
                    log_error_with_context!(&e, "Failed to start browser session");
                    eprintln!("Failed to start browser session: {e}");
                    return Ok(4);
                }
            };

        let coordinator = match coordinator_for(&config, Arc::new(driver), shutdown_signal).await {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to initialize run: {e}");
                return Ok(2);
            }
        };

        println!("🚀 Starting run...");
        println!();

        let summary = match coordinator.execute().await {
            Ok(s) => s,
            Err(e @ HarvestError::Automation(_)) => {
                log_error_with_context!(&e, "Run aborted");
                eprintln!("Run aborted: {e}");
                return Ok(4);
            }
            Err(e) => {
                log_error_with_context!(&e, "Run failed");
                eprintln!("Run failed: {e}");
                return Ok(5);
            }
        };

        print_summary(&summary);

        if summary.interrupted {
            Ok(130)
        } else if summary.is_successful() {
            Ok(0)
        } else {
            Ok(1)
        }
    }

    fn confirm(config: &HarvestConfig) -> anyhow::Result<bool> {
        use std::io::{self, Write};

        println!("Run Configuration:");
        println!("  Portal: {}", config.portal.entry_url);
        println!("  WebDriver: {} ({:?})", config.webdriver.url, config.webdriver.browser);
        println!("  Download root: {}", config.download.directory.display());
        println!("  Filtered states: {}", config.queries.filtered_states.len());
        println!("  Unfiltered states: {}", config.queries.unfiltered_states.len());
        println!("  Queries: {}", config.queries.queries().len());
        println!();
        print!("Proceed with run? [y/N]: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().eq_ignore_ascii_case("y"))
    }
}

/// Prints the run summary to stdout
pub(crate) fn print_summary(summary: &RunSummary) {
    println!();
    println!("📊 Run Summary:");
    println!("  Queries: {}", summary.queries.len());
    println!("  Completed: {}", summary.completed());
    println!("  Failed: {}", summary.failed());
    println!("  Skipped: {}", summary.skipped());
    println!("  Pages captured: {}", summary.total_pages());
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    if summary.interrupted {
        println!("  ⚠️  Interrupted before all queries ran");
    }
    println!();

    if !summary.datasets.is_empty() {
        println!("📁 Datasets:");
        for tier in [DatasetTier::Combined, DatasetTier::Consolidated, DatasetTier::Global] {
            for dataset in summary.datasets_of(tier) {
                println!(
                    "  [{}] {} ({} rows, sha256 {})",
                    dataset.tier,
                    dataset.path.display(),
                    dataset.rows,
                    &dataset.sha256[..12.min(dataset.sha256.len())]
                );
            }
        }
        println!();
    }

    let failures: Vec<_> = summary
        .queries
        .iter()
        .filter(|r| matches!(r.outcome, QueryOutcome::Failed { .. }))
        .collect();
    if !failures.is_empty() {
        println!("❌ Failed queries:");
        for record in failures {
            println!("  - {}: {}", record.query, record.outcome);
        }
        println!();
    }

    if !summary.errors.is_empty() {
        println!("⚠️  Errors:");
        for error in &summary.errors {
            match &error.context {
                Some(context) => println!("  - [{context}] {}", error.message),
                None => println!("  - {}", error.message),
            }
        }
        println!();
    }
}

/// Builds the coordinator for a connected browser, closing the browser when
/// that fails
async fn coordinator_for(
    config: &HarvestConfig,
    driver: Arc<dyn Automation>,
    shutdown_signal: watch::Receiver<bool>,
) -> Result<RunCoordinator, HarvestError> {
    match RunCoordinator::from_config(
        config,
        driver.clone(),
        signal_for(&config.checkpoints),
        shutdown_signal,
    ) {
        Ok(coordinator) => Ok(coordinator),
        Err(e) => {
            if let Err(shutdown_err) = driver.shutdown().await {
                tracing::warn!(error = %shutdown_err, "Browser shutdown failed");
            }
            Err(e)
        }
    }
}
