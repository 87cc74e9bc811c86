//! Core business logic for Harvest.
//!
//! # Modules
//!
//! - [`layout`] - Canonical file names and the on-disk layout
//! - [`session`] - The per-query export-and-paginate state machine
//! - [`consolidate`] - Page-combine, state-consolidate and global merge
//! - [`run`] - Query orchestration and the run summary
//! - [`checkpoint`] - Operator ready/finish signals
//!
//! # Run Workflow
//!
//! 1. **Open**: navigate to the portal entry page, wait for the operator
//! 2. **Query**: for each (state, business type), drive the session page by page
//! 3. **Combine**: merge the query's pages into its combined dataset
//! 4. **Consolidate**: merge a filtered state's combined datasets
//! 5. **Merge**: fold every state into the run-wide dataset
//! 6. **Report**: log and print the run summary
//!
//! # Example
//!
//! ```rust,no_run
//! use harvest::adapters::automation::WebDriverAutomation;
//! use harvest::config::load_config;
//! use harvest::core::checkpoint::signal_for;
//! use harvest::core::run::RunCoordinator;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("harvest.toml")?;
//! let driver = WebDriverAutomation::connect(&config.webdriver, &config.download.directory).await?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let coordinator = RunCoordinator::from_config(
//!     &config,
//!     Arc::new(driver),
//!     signal_for(&config.checkpoints),
//!     shutdown_rx,
//! )?;
//!
//! let summary = coordinator.execute().await?;
//! println!("Completed: {}", summary.completed());
//! println!("Failed: {}", summary.failed());
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod consolidate;
pub mod context;
pub mod layout;
pub mod run;
pub mod session;

pub use context::RunContext;
