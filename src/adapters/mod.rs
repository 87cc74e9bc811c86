//! External system integrations for Harvest.
//!
//! - [`automation`] - Browser automation (trait plus W3C WebDriver client)
//! - [`tabular`] - Lenient CSV reading and atomic CSV writing
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies so the export session and the
//! consolidation pipeline can be tested without a browser. The session only
//! ever sees the [`automation::Automation`] trait.
//!
//! ```rust,no_run
//! use harvest::adapters::automation::{Automation, Selector, WebDriverAutomation};
//! use harvest::config::WebDriverConfig;
//! use std::path::Path;
//! use std::str::FromStr;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WebDriverConfig::default();
//! let driver = WebDriverAutomation::connect(&config, Path::new("/tmp/downloads")).await?;
//!
//! driver.navigate("https://example.com").await?;
//! let submit = driver.find_control(&Selector::from_str("id:frm_submit")?).await?;
//! println!("Submit present: {}", submit.is_some());
//! driver.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod automation;
pub mod tabular;
