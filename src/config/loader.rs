//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{Browser, CheckpointMode, HarvestConfig};
use crate::domain::errors::HarvestError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into HarvestConfig
/// 4. Applies environment variable overrides (HARVEST_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use harvest::config::loader::load_config;
///
/// let config = load_config("harvest.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<HarvestConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(HarvestError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        HarvestError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text, applying substitution, overrides and validation
///
/// # Errors
///
/// Same as [`load_config`], minus the file access.
pub fn parse_config(contents: &str) -> Result<HarvestConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: HarvestConfig = toml::from_str(&contents)
        .map_err(|e| HarvestError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        HarvestError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| HarvestError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(HarvestError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using HARVEST_* prefix
///
/// Environment variables follow the pattern: HARVEST_<SECTION>_<KEY>
/// For example: HARVEST_WEBDRIVER_URL, HARVEST_DOWNLOAD_DIRECTORY
fn apply_env_overrides(config: &mut HarvestConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("HARVEST_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // WebDriver overrides
    if let Ok(val) = std::env::var("HARVEST_WEBDRIVER_URL") {
        config.webdriver.url = val;
    }
    if let Ok(val) = std::env::var("HARVEST_WEBDRIVER_BROWSER") {
        config.webdriver.browser = match val.to_lowercase().as_str() {
            "edge" => Browser::Edge,
            "chrome" => Browser::Chrome,
            other => {
                return Err(HarvestError::Configuration(format!(
                    "HARVEST_WEBDRIVER_BROWSER must be 'edge' or 'chrome', got '{other}'"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("HARVEST_WEBDRIVER_START_MAXIMIZED") {
        config.webdriver.start_maximized = val.parse().unwrap_or(true);
    }

    // Portal overrides
    if let Ok(val) = std::env::var("HARVEST_PORTAL_ENTRY_URL") {
        config.portal.entry_url = val;
    }
    if let Ok(val) = std::env::var("HARVEST_PORTAL_RAW_FILENAME") {
        config.portal.raw_filename = val;
    }

    // Download overrides
    if let Ok(val) = std::env::var("HARVEST_DOWNLOAD_DIRECTORY") {
        config.download.directory = PathBuf::from(val);
    }

    // Timing overrides
    if let Ok(val) = std::env::var("HARVEST_TIMING_POLL_INTERVAL_MS") {
        if let Ok(ms) = val.parse() {
            config.timing.poll_interval_ms = ms;
        }
    }

    // Checkpoint overrides
    if let Ok(val) = std::env::var("HARVEST_CHECKPOINTS_MODE") {
        config.checkpoints.mode =
            CheckpointMode::from_str(&val).map_err(HarvestError::Configuration)?;
    }

    // Consolidation overrides
    if let Ok(val) = std::env::var("HARVEST_CONSOLIDATION_GLOBAL_ENABLED") {
        config.consolidation.global_enabled = val.parse().unwrap_or(true);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("HARVEST_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("HARVEST_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
