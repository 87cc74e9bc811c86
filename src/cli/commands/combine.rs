//! Combine command implementation
//!
//! Re-runs page-combine, state-consolidate and the run-wide merge over files
//! already in the download root. No browser is started.

use super::run::print_summary;
use crate::cli::restrict_queries;
use crate::config::load_config;
use crate::core::layout::Layout;
use crate::core::run::rebuild_datasets;
use clap::Args;

/// Arguments for the combine command
#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Only rebuild these states (comma-separated, must be configured)
    #[arg(long)]
    pub state: Option<String>,

    /// Skip the run-wide merge
    #[arg(long)]
    pub no_global: bool,
}

impl CombineArgs {
    /// Execute the combine command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Rebuilding datasets");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        if let Some(states) = &self.state {
            if let Err(e) = restrict_queries(&mut config.queries, states) {
                println!("❌ Invalid --state: {e}");
                return Ok(2);
            }
        }

        if self.no_global {
            config.consolidation.global_enabled = false;
        }

        let layout = Layout::new(&config.download.directory);
        if !layout.root().is_dir() {
            println!(
                "❌ Download directory does not exist: {}",
                layout.root().display()
            );
            return Ok(2);
        }

        let summary = rebuild_datasets(&layout, &config.queries, &config.consolidation);
        print_summary(&summary);

        if summary.errors.is_empty() {
            Ok(0)
        } else {
            Ok(1)
        }
    }
}
