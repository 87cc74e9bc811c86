//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// States queried once per business type
const FILTERED_STATES: &[&str] = &[
    "Maharashtra",
    "NCT of Delhi",
    "Rajasthan",
    "Tamil Nadu",
    "Telangana",
    "Uttar Pradesh",
    "Gujarat",
    "Haryana",
    "Karnataka",
    "West Bengal",
];

/// States queried once with no business-type filter
const UNFILTERED_STATES: &[&str] = &[
    "Andaman & Nicobar",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Puducherry",
    "Punjab",
    "Sikkim",
    "Tripura",
    "Uttarakhand",
    "Madhya Pradesh",
    "Lakshadweep",
    "Ladakh",
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chandigarh",
    "Chhattisgarh",
    "Dadra & Nagar Haveli",
    "Daman & Diu",
    "Goa",
    "Himachal Pradesh",
    "Jammu & Kashmir",
    "Jharkhand",
    "Kerala",
];

const BUSINESS_TYPES: &[&str] = &[
    "Agriculture and Allied Activities",
    "Business Services",
    "Community, personal & Social Services",
    "Construction",
    "Electricity, Gas & Water companies",
    "Finance",
    "Insurance",
    "Manufacturing (Food stuffs)",
    "Manufacturing (Leather & products thereof)",
    "Manufacturing (Machinery & Equipments)",
    "Manufacturing (Metals & Chemicals, and products thereof)",
    "Manufacturing (Others)",
    "Manufacturing (Paper & Paper products, Publishing, printing and reproduction of recorded media)",
    "Manufacturing (Textiles)",
    "Manufacturing (Wood Products)",
    "Mining & Quarrying",
    "Real Estate and Renting",
    "Trading",
    "Transport, storage and Communications",
];

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "harvest.toml")]
    pub output: String,

    /// Include every section with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Harvest configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Start msedgedriver (or chromedriver) on port 9515");
                println!("  2. Edit {} and set download.directory", self.output);
                println!("  3. Validate configuration: harvest validate-config");
                println!("  4. Run export: harvest run");
                println!("  5. Log in to the portal in the opened browser, then confirm");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        format!(
            r#"# Harvest Configuration File
# Paginated portal export and CSV consolidation

[application]
log_level = "info"

[webdriver]
url = "http://localhost:9515"
browser = "edge"

[download]
directory = "downloads"

{queries}
[checkpoints]
mode = "prompt"

[logging]
local_enabled = true
local_path = "logs"
local_rotation = "daily"
"#,
            queries = Self::queries_section()
        )
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        format!(
            r#"# Harvest Configuration File
# Paginated portal export and CSV consolidation
#
# Every value below is the default unless marked otherwise. Any line may use
# ${{VAR}} to pull a value from the environment, and most settings can be
# overridden with HARVEST_<SECTION>_<KEY> variables.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# WebDriver
# ============================================================================
[webdriver]
# URL of a running msedgedriver / chromedriver
url = "http://localhost:9515"

# Browser family: edge or chrome
browser = "edge"

# Open the browser window maximized
start_maximized = true

# Per-request timeout in seconds
request_timeout_seconds = 120

# ============================================================================
# Portal
# ============================================================================
[portal]
# Search page every query starts from
entry_url = "https://firstsource.cmie.com/kommon/bin/sr.php?kall=wadvsearch"

# Name the portal gives every raw export
raw_filename = "data.csv"

# UI anchors, written as id:<id>, css:<selector> or xpath:<expr>
[portal.selectors]
category_tab = "xpath://a[@class='nav-link' and @href='#category']"
business_select = "id:nature_of_business"
location_tab = "xpath://a[@class='nav-link' and @href='#location']"
state_select = "id:state_name"
submit = "id:frm_submit"
export_link = "xpath://a[contains(@id, 'exporttocsv_') and contains(text(), 'Export to CSV')]"
next_page = "xpath://input[@class='img_but_next']"
overlay = "css:a.nav-link.dropdown-toggle"

# ============================================================================
# Downloads
# ============================================================================
[download]
# The browser saves exports here; every output is written beneath it
directory = "downloads"
# directory = "${{HARVEST_DOWNLOADS}}"

# ============================================================================
# Timing (milliseconds)
# ============================================================================
[timing]
# Readiness polls: how often, and how long for each wait
poll_interval_ms = 250
tab_timeout_ms = 10000
select_timeout_ms = 10000
submit_timeout_ms = 5000
export_timeout_ms = 30000
download_timeout_ms = 40000
next_page_timeout_ms = 30000
overlay_timeout_ms = 3000
staleness_timeout_ms = 20000

# Fixed pauses after actions with no observable readiness signal
navigation_settle_ms = 2000
selection_settle_ms = 2000
page_settle_ms = 5000
scroll_settle_ms = 1000

# ============================================================================
# Queries
# ============================================================================
{queries}
# ============================================================================
# Consolidation
# ============================================================================
[consolidation]
# Merge every state's dataset into one run-wide file
global_enabled = true
global_filename = "all_states.csv"

# ============================================================================
# Operator Checkpoints
# ============================================================================
[checkpoints]
# prompt: press Enter in the console
# file:   touch ready_file / finish_file
# none:   do not wait
mode = "prompt"
ready_file = "harvest.ready"
finish_file = "harvest.finish"
poll_interval_ms = 1000

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable JSON file logging
local_enabled = true

# Log directory
local_path = "logs"

# Log rotation (daily, hourly or never)
local_rotation = "daily"
"#,
            queries = Self::queries_section()
        )
    }

    fn queries_section() -> String {
        format!(
            r#"[queries]
filtered_states = {filtered}

unfiltered_states = {unfiltered}

business_types = {business}

[[queries.exclusions]]
state = "Maharashtra"
business_type = "Business Services"
"#,
            filtered = toml_list(FILTERED_STATES),
            unfiltered = toml_list(UNFILTERED_STATES),
            business = toml_list(BUSINESS_TYPES),
        )
    }
}

fn toml_list(items: &[&str]) -> String {
    let mut out = String::from("[\n");
    for item in items {
        out.push_str(&format!("    \"{item}\",\n"));
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "harvest.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "harvest.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_configs_are_valid() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config = parse_config(&content).unwrap();
            assert_eq!(config.queries.filtered_states.len(), 10);
            assert_eq!(config.queries.unfiltered_states.len(), 27);
            assert_eq!(config.queries.business_types.len(), 19);
            // 10 x 19 minus the one exclusion, plus 27 unfiltered
            assert_eq!(config.queries.queries().len(), 10 * 19 - 1 + 27);
        }
    }

    #[test]
    fn test_generated_config_keeps_exclusion() {
        let config = parse_config(&InitArgs::generate_minimal_config()).unwrap();
        let maharashtra = crate::domain::StateName::new("Maharashtra").unwrap();
        let services = crate::domain::BusinessType::new("Business Services").unwrap();
        assert!(config.queries.is_excluded(&maharashtra, &services));
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("harvest.toml");
        fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().into_owned(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "existing");

        let args = InitArgs { force: true, ..args };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&output).unwrap().contains("[queries]"));
    }
}
