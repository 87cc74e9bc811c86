//! Status command implementation
//!
//! This module implements the `status` command: for every configured query,
//! how many page exports are on disk and whether its datasets exist.

use crate::config::{load_config, QueryConfig};
use crate::core::layout::Layout;
use crate::domain::{Query, Result, StateName};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Filter by state label
    #[arg(long)]
    pub state: Option<String>,
}

/// On-disk state of one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStatus {
    pub query: Query,
    pub pages: usize,
    pub combined: bool,
}

/// On-disk state of one filtered state's consolidation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStatus {
    pub state: StateName,
    pub consolidated: bool,
}

/// Walks the layout for every query in the plan
pub fn collect_status(
    layout: &Layout,
    queries: &QueryConfig,
) -> Result<(Vec<QueryStatus>, Vec<StateStatus>)> {
    let mut query_status = Vec::new();
    for query in queries.queries() {
        let pages = layout.page_files(&query)?.len();
        let combined = layout.combined_path(&query).is_file();
        query_status.push(QueryStatus {
            query,
            pages,
            combined,
        });
    }

    let state_status = queries
        .filtered_states
        .iter()
        .map(|state| StateStatus {
            state: state.clone(),
            consolidated: layout.consolidated_path(state).is_file(),
        })
        .collect();

    Ok((query_status, state_status))
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking run status");

        println!("📊 Harvest Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {}", e);
                return Ok(2);
            }
        };

        let layout = Layout::new(&config.download.directory);
        if !layout.root().is_dir() {
            println!("No downloads found in {}.", layout.root().display());
            println!("Run 'harvest run' to start exporting data.");
            return Ok(0);
        }

        let (queries, states) = match collect_status(&layout, &config.queries) {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to read download directory");
                println!("   Error: {}", e);
                return Ok(5);
            }
        };

        let queries: Vec<_> = queries
            .into_iter()
            .filter(|q| match &self.state {
                Some(state) => q.query.state().as_str() == state,
                None => true,
            })
            .collect();

        if queries.is_empty() {
            println!("No queries match the specified filters.");
            return Ok(0);
        }

        println!("{:<70} {:<8} {:<10}", "Query", "Pages", "Combined");
        println!("{}", "-".repeat(90));
        for status in &queries {
            println!(
                "{:<70} {:<8} {:<10}",
                status.query.to_string(),
                status.pages,
                if status.combined { "✅" } else { "-" }
            );
        }
        println!();

        let states: Vec<_> = states
            .into_iter()
            .filter(|s| match &self.state {
                Some(state) => s.state.as_str() == state,
                None => true,
            })
            .collect();
        if !states.is_empty() {
            println!("{:<40} {:<12}", "State", "Consolidated");
            println!("{}", "-".repeat(54));
            for status in &states {
                println!(
                    "{:<40} {:<12}",
                    status.state.as_str(),
                    if status.consolidated { "✅" } else { "-" }
                );
            }
            println!();
        }

        let global = layout.global_path(&config.consolidation.global_filename);
        if global.is_file() {
            println!("Run-wide dataset: {}", global.display());
        }

        let done = queries.iter().filter(|q| q.combined).count();
        println!("{done}/{} queries have a combined dataset.", queries.len());
        println!();
        Ok(0)
    }
}
