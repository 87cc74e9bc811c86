//! Configuration management for Harvest.
//!
//! # Overview
//!
//! Harvest uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `HARVEST_<SECTION>_<KEY>` environment overrides
//! - Defaults matching the portal the tool targets
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use harvest::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("harvest.toml")?;
//!
//! println!("Portal: {}", config.portal.entry_url);
//! println!("Queries: {}", config.queries.queries().len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`WebDriverConfig`] - Driver endpoint and browser
//! - [`PortalConfig`] - Entry URL, raw export name and UI selectors
//! - [`DownloadConfig`] - Download root
//! - [`TimingConfig`] - Bounded waits and settle delays
//! - [`QueryConfig`] - States, business types and exclusions
//! - [`ConsolidationConfig`] - Run-wide merge
//! - [`CheckpointConfig`] - Operator checkpoints
//! - [`LoggingConfig`] - File logging
//!
//! # Example Configuration
//!
//! ```toml
//! [webdriver]
//! url = "http://localhost:9515"
//! browser = "edge"
//!
//! [download]
//! directory = "${HARVEST_DOWNLOADS}"
//!
//! [queries]
//! filtered_states = ["Gujarat"]
//! unfiltered_states = ["Goa"]
//! business_types = ["Trading"]
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, Browser, CheckpointConfig, CheckpointMode, ConsolidationConfig,
    DownloadConfig, Exclusion, HarvestConfig, LoggingConfig, PortalConfig, PortalSelectors,
    QueryConfig, SelectorConfig, TimingConfig, WebDriverConfig,
};
