//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Harvest using clap.

pub mod commands;

use crate::config::QueryConfig;
use crate::domain::StateName;
use clap::{Parser, Subcommand};

/// Harvest - Portal Export Tool
#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(version, about, long_about = None)]
#[command(author = "Harvest Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "harvest.toml", env = "HARVEST_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "HARVEST_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the portal and export every configured query
    Run(commands::run::RunArgs),

    /// Rebuild combined and consolidated datasets from files on disk
    Combine(commands::combine::CombineArgs),

    /// Show what is on disk for each configured query
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

/// Parses a comma-separated `--state` value
pub(crate) fn parse_state_list(value: &str) -> Result<Vec<StateName>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(StateName::new)
        .collect()
}

/// Narrows the query plan to the states named on the command line
///
/// Every named state must already be configured, filtered or unfiltered.
pub(crate) fn restrict_queries(queries: &mut QueryConfig, value: &str) -> Result<(), String> {
    let states = parse_state_list(value)?;
    if states.is_empty() {
        return Err("--state needs at least one state name".to_string());
    }

    for state in &states {
        let known = queries.filtered_states.contains(state)
            || queries.unfiltered_states.contains(state);
        if !known {
            return Err(format!("State '{state}' is not in the configuration"));
        }
    }

    let labels: Vec<&str> = states.iter().map(StateName::as_str).collect();
    tracing::info!(states = ?labels, "Restricting run to states from CLI");
    queries.restrict_to(&states);
    Ok(())
}
