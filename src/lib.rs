// Harvest - Paginated Portal Export and CSV Consolidation Tool
// Copyright (c) 2025 Harvest Contributors
// Licensed under the MIT License

//! # Harvest - Paginated Portal Export and CSV Consolidation
//!
//! Harvest drives a login-gated company-search portal through a WebDriver
//! browser, exports every results page of every (state, business type) query
//! as CSV, and merges the exports into per-query, per-state and run-wide
//! datasets.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Enumerating** queries from configured states, business types and exclusions
//! - **Exporting** each results page through a bounded-wait state machine
//! - **Naming** every page export canonically inside its query directory
//! - **Consolidating** pages, states and the whole run into CSV datasets
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (session, layout, consolidation, run)
//! - [`adapters`] - External integrations (WebDriver, CSV)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use harvest::adapters::automation::WebDriverAutomation;
//! use harvest::config::load_config;
//! use harvest::core::checkpoint::signal_for;
//! use harvest::core::run::RunCoordinator;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("harvest.toml")?;
//!     let driver =
//!         WebDriverAutomation::connect(&config.webdriver, &config.download.directory).await?;
//!
//!     let (_tx, rx) = tokio::sync::watch::channel(false);
//!     let coordinator =
//!         RunCoordinator::from_config(&config, Arc::new(driver), signal_for(&config.checkpoints), rx)?;
//!
//!     let summary = coordinator.execute().await?;
//!     println!("Captured {} pages", summary.total_pages());
//!     Ok(())
//! }
//! ```
//!
//! ## Rebuilding Datasets
//!
//! Consolidation only reads files, so it can be re-run without a browser:
//!
//! ```rust,no_run
//! use harvest::config::load_config;
//! use harvest::core::layout::Layout;
//! use harvest::core::run::rebuild_datasets;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("harvest.toml")?;
//! let layout = Layout::new(&config.download.directory);
//! let summary = rebuild_datasets(&layout, &config.queries, &config.consolidation);
//! println!("Wrote {} datasets", summary.datasets.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::HarvestError`]; the binary wraps it with
//! `anyhow` and maps outcomes to exit codes.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
