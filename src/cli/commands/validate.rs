//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Harvest configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let queries = config.queries.queries();
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  WebDriver: {} ({:?})",
            config.webdriver.url, config.webdriver.browser
        );
        println!("  Portal: {}", config.portal.entry_url);
        println!("  Download root: {}", config.download.directory.display());
        println!(
            "  Filtered states: {}",
            config.queries.filtered_states.len()
        );
        println!(
            "  Unfiltered states: {}",
            config.queries.unfiltered_states.len()
        );
        println!("  Business types: {}", config.queries.business_types.len());
        println!("  Exclusions: {}", config.queries.exclusions.len());
        println!("  Queries: {}", queries.len());
        println!("  Checkpoints: {:?}", config.checkpoints.mode);
        if config.consolidation.global_enabled {
            println!("  Run-wide dataset: {}", config.consolidation.global_filename);
        }
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_validate_valid_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("harvest.toml");
        fs::write(&path, "[queries]\nunfiltered_states = [\"Goa\"]\n").unwrap();

        let code = ValidateArgs {}
            .execute(&path.to_string_lossy())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_validate_invalid_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("harvest.toml");
        fs::write(&path, "[queries]\nfiltered_states = [\"Goa\"]\n").unwrap();

        let code = ValidateArgs {}
            .execute(&path.to_string_lossy())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
