//! Configuration schema types
//!
//! This module defines the configuration structure for Harvest. Every section
//! maps to a TOML table; optional settings fall back to the defaults of the
//! portal the tool was built against.

use crate::adapters::automation::Selector;
use crate::core::layout::{query_stem, sanitize};
use crate::domain::{BusinessType, Query, StateName};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Main Harvest configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// WebDriver endpoint and browser settings
    #[serde(default)]
    pub webdriver: WebDriverConfig,

    /// Portal entry point and UI anchors
    #[serde(default)]
    pub portal: PortalConfig,

    /// Download directory (the root of the persisted layout)
    #[serde(default)]
    pub download: DownloadConfig,

    /// Bounded waits and settle delays
    #[serde(default)]
    pub timing: TimingConfig,

    /// Query dimensions
    pub queries: QueryConfig,

    /// Consolidation settings
    #[serde(default)]
    pub consolidation: ConsolidationConfig,

    /// Operator checkpoints
    #[serde(default)]
    pub checkpoints: CheckpointConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HarvestConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.webdriver.validate()?;
        self.portal.validate()?;
        self.download.validate()?;
        self.timing.validate()?;
        self.queries.validate()?;
        self.consolidation.validate()?;
        self.checkpoints.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Browser family driven through WebDriver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    /// Microsoft Edge (msedgedriver)
    #[default]
    Edge,
    /// Google Chrome (chromedriver)
    Chrome,
}

/// WebDriver endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDriverConfig {
    /// URL of a running WebDriver server (msedgedriver / chromedriver)
    #[serde(default = "default_webdriver_url")]
    pub url: String,

    /// Browser family
    #[serde(default)]
    pub browser: Browser,

    /// Start the browser window maximized
    #[serde(default = "default_true")]
    pub start_maximized: bool,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: default_webdriver_url(),
            browser: Browser::default(),
            start_maximized: true,
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl WebDriverConfig {
    fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.url)
            .map_err(|e| format!("Invalid webdriver.url '{}': {e}", self.url))?;
        if self.request_timeout_seconds == 0 {
            return Err("webdriver.request_timeout_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

/// Portal entry point and the named UI anchors the session drives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Search page every query starts from
    #[serde(default = "default_entry_url")]
    pub entry_url: String,

    /// Name the portal gives every raw export
    #[serde(default = "default_raw_filename")]
    pub raw_filename: String,

    /// UI anchors
    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            entry_url: default_entry_url(),
            raw_filename: default_raw_filename(),
            selectors: SelectorConfig::default(),
        }
    }
}

impl PortalConfig {
    fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.entry_url)
            .map_err(|e| format!("Invalid portal.entry_url '{}': {e}", self.entry_url))?;

        if self.raw_filename.trim().is_empty()
            || self.raw_filename.contains('/')
            || self.raw_filename.contains('\\')
        {
            return Err(format!(
                "portal.raw_filename must be a bare file name, got '{}'",
                self.raw_filename
            ));
        }

        self.selectors.validate()
    }
}

/// Selector strings for each UI anchor (`id:`, `css:` or `xpath:` prefixed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default = "default_category_tab")]
    pub category_tab: String,

    #[serde(default = "default_business_select")]
    pub business_select: String,

    #[serde(default = "default_location_tab")]
    pub location_tab: String,

    #[serde(default = "default_state_select")]
    pub state_select: String,

    #[serde(default = "default_submit")]
    pub submit: String,

    #[serde(default = "default_export_link")]
    pub export_link: String,

    #[serde(default = "default_next_page")]
    pub next_page: String,

    /// Transient control that may cover the next-page button
    #[serde(default = "default_overlay")]
    pub overlay: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            category_tab: default_category_tab(),
            business_select: default_business_select(),
            location_tab: default_location_tab(),
            state_select: default_state_select(),
            submit: default_submit(),
            export_link: default_export_link(),
            next_page: default_next_page(),
            overlay: default_overlay(),
        }
    }
}

/// Parsed form of [`SelectorConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSelectors {
    pub category_tab: Selector,
    pub business_select: Selector,
    pub location_tab: Selector,
    pub state_select: Selector,
    pub submit: Selector,
    pub export_link: Selector,
    pub next_page: Selector,
    pub overlay: Selector,
}

impl SelectorConfig {
    fn validate(&self) -> Result<(), String> {
        self.parse().map(|_| ())
    }

    /// Parses every selector string
    ///
    /// # Errors
    ///
    /// Returns the first selector that has no recognised prefix
    pub fn parse(&self) -> Result<PortalSelectors, String> {
        let parse = |name: &str, raw: &str| {
            Selector::from_str(raw).map_err(|e| format!("portal.selectors.{name}: {e}"))
        };

        Ok(PortalSelectors {
            category_tab: parse("category_tab", &self.category_tab)?,
            business_select: parse("business_select", &self.business_select)?,
            location_tab: parse("location_tab", &self.location_tab)?,
            state_select: parse("state_select", &self.state_select)?,
            submit: parse("submit", &self.submit)?,
            export_link: parse("export_link", &self.export_link)?,
            next_page: parse("next_page", &self.next_page)?,
            overlay: parse("overlay", &self.overlay)?,
        })
    }
}

/// Download directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory the browser saves exports into; root of the persisted layout
    #[serde(default = "default_download_directory")]
    pub directory: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: default_download_directory(),
        }
    }
}

impl DownloadConfig {
    fn validate(&self) -> Result<(), String> {
        if self.directory.as_os_str().is_empty() {
            return Err("download.directory cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Bounded waits and settle delays, all in milliseconds
///
/// Timeouts bound polls against an observable readiness condition. Settle
/// delays are fixed pauses after actions that expose no readiness signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimingConfig {
    /// Interval between readiness polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Category / location tabs becoming clickable
    #[serde(default = "default_tab_timeout_ms")]
    pub tab_timeout_ms: u64,

    /// Dropdown controls becoming present
    #[serde(default = "default_tab_timeout_ms")]
    pub select_timeout_ms: u64,

    /// Submit button becoming clickable
    #[serde(default = "default_submit_timeout_ms")]
    pub submit_timeout_ms: u64,

    /// Export link becoming clickable on a results page
    #[serde(default = "default_export_timeout_ms")]
    pub export_timeout_ms: u64,

    /// Raw export appearing on disk
    #[serde(default = "default_download_timeout_ms")]
    pub download_timeout_ms: u64,

    /// Next-page control becoming clickable
    #[serde(default = "default_next_page_timeout_ms")]
    pub next_page_timeout_ms: u64,

    /// Overlay becoming visible (absence is fine)
    #[serde(default = "default_overlay_timeout_ms")]
    pub overlay_timeout_ms: u64,

    /// Previous next-page control going stale after navigation
    #[serde(default = "default_staleness_timeout_ms")]
    pub staleness_timeout_ms: u64,

    /// Pause after re-navigating to the entry point
    #[serde(default = "default_short_settle_ms")]
    pub navigation_settle_ms: u64,

    /// Pause after tab clicks and dropdown selections
    #[serde(default = "default_short_settle_ms")]
    pub selection_settle_ms: u64,

    /// Pause before looking for the export link on each page
    #[serde(default = "default_page_settle_ms")]
    pub page_settle_ms: u64,

    /// Pause after scrolling or dismissing the overlay
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            tab_timeout_ms: default_tab_timeout_ms(),
            select_timeout_ms: default_tab_timeout_ms(),
            submit_timeout_ms: default_submit_timeout_ms(),
            export_timeout_ms: default_export_timeout_ms(),
            download_timeout_ms: default_download_timeout_ms(),
            next_page_timeout_ms: default_next_page_timeout_ms(),
            overlay_timeout_ms: default_overlay_timeout_ms(),
            staleness_timeout_ms: default_staleness_timeout_ms(),
            navigation_settle_ms: default_short_settle_ms(),
            selection_settle_ms: default_short_settle_ms(),
            page_settle_ms: default_page_settle_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
        }
    }
}

impl TimingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("timing.poll_interval_ms must be > 0".to_string());
        }

        let bounded = [
            ("tab_timeout_ms", self.tab_timeout_ms),
            ("select_timeout_ms", self.select_timeout_ms),
            ("submit_timeout_ms", self.submit_timeout_ms),
            ("export_timeout_ms", self.export_timeout_ms),
            ("download_timeout_ms", self.download_timeout_ms),
            ("next_page_timeout_ms", self.next_page_timeout_ms),
            ("overlay_timeout_ms", self.overlay_timeout_ms),
            ("staleness_timeout_ms", self.staleness_timeout_ms),
        ];
        for (name, value) in bounded {
            if value == 0 {
                return Err(format!("timing.{name} must be > 0"));
            }
            if value < self.poll_interval_ms {
                return Err(format!(
                    "timing.{name} ({value}ms) is shorter than timing.poll_interval_ms ({}ms)",
                    self.poll_interval_ms
                ));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// A (state, business type) pair that is never queried
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exclusion {
    pub state: StateName,
    pub business_type: BusinessType,
}

/// Query dimensions
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryConfig {
    /// States crossed with every business type
    #[serde(default)]
    pub filtered_states: Vec<StateName>,

    /// States queried once with no business-type filter
    #[serde(default)]
    pub unfiltered_states: Vec<StateName>,

    /// Business-type labels
    #[serde(default)]
    pub business_types: Vec<BusinessType>,

    /// Pairs skipped during enumeration
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
}

impl QueryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.filtered_states.is_empty() && self.unfiltered_states.is_empty() {
            return Err(
                "queries: at least one of filtered_states or unfiltered_states must be set"
                    .to_string(),
            );
        }

        if !self.filtered_states.is_empty() && self.business_types.is_empty() {
            return Err("queries.business_types is required when filtered_states is set".to_string());
        }

        let mut states = HashSet::new();
        for state in self.filtered_states.iter().chain(&self.unfiltered_states) {
            if !states.insert(state) {
                return Err(format!(
                    "queries: state '{state}' is listed more than once across filtered_states and unfiltered_states"
                ));
            }
        }

        let mut types = HashSet::new();
        for bt in &self.business_types {
            if !types.insert(bt) {
                return Err(format!("queries.business_types: duplicate entry '{bt}'"));
            }
        }

        self.validate_file_names()?;

        for exclusion in &self.exclusions {
            if !self.filtered_states.contains(&exclusion.state) {
                return Err(format!(
                    "queries.exclusions: state '{}' is not a filtered state",
                    exclusion.state
                ));
            }
            if !self.business_types.contains(&exclusion.business_type) {
                return Err(format!(
                    "queries.exclusions: business type '{}' is not configured",
                    exclusion.business_type
                ));
            }
        }

        Ok(())
    }

    /// Labels map to directory and file names through `sanitize`, so distinct
    /// labels must stay distinct on disk, and no directory may fall under
    /// another filtered state's `{state}_*` prefix.
    fn validate_file_names(&self) -> Result<(), String> {
        let mut seen: HashMap<String, &StateName> = HashMap::new();
        for state in self.filtered_states.iter().chain(&self.unfiltered_states) {
            if let Some(other) = seen.insert(sanitize(state.as_str()), state) {
                return Err(format!(
                    "queries: states '{other}' and '{state}' map to the same file name '{}'",
                    sanitize(state.as_str())
                ));
            }
        }

        let mut seen: HashMap<String, &BusinessType> = HashMap::new();
        for bt in &self.business_types {
            if let Some(other) = seen.insert(sanitize(bt.as_str()), bt) {
                return Err(format!(
                    "queries.business_types: '{other}' and '{bt}' map to the same file name '{}'",
                    sanitize(bt.as_str())
                ));
            }
        }

        let queries = self.queries();
        for state in &self.filtered_states {
            let prefix = format!("{}_", sanitize(state.as_str()));
            if let Some(query) = queries
                .iter()
                .find(|q| q.state() != state && query_stem(q).starts_with(&prefix))
            {
                return Err(format!(
                    "queries: directory '{}' of '{query}' would be merged into state '{state}'",
                    query_stem(query)
                ));
            }
        }

        Ok(())
    }

    /// True when the pair is in the exclusion set
    pub fn is_excluded(&self, state: &StateName, business_type: &BusinessType) -> bool {
        self.exclusions
            .iter()
            .any(|e| &e.state == state && &e.business_type == business_type)
    }

    /// Keeps only the named states (labels compared exactly)
    pub fn restrict_to(&mut self, states: &[StateName]) {
        self.filtered_states.retain(|s| states.contains(s));
        self.unfiltered_states.retain(|s| states.contains(s));
        self.exclusions.retain(|e| states.contains(&e.state));
    }

    /// Every query the configuration enumerates, exclusions removed
    pub fn queries(&self) -> Vec<Query> {
        let filtered = self.filtered_states.iter().flat_map(|state| {
            self.business_types
                .iter()
                .filter(move |bt| !self.is_excluded(state, bt))
                .map(move |bt| Query::filtered(state.clone(), bt.clone()))
        });
        let unfiltered = self
            .unfiltered_states
            .iter()
            .map(|state| Query::unfiltered(state.clone()));
        filtered.chain(unfiltered).collect()
    }
}

/// Consolidation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationConfig {
    /// Merge every state's final dataset into one file at the end of a run
    #[serde(default = "default_true")]
    pub global_enabled: bool,

    /// File name of the run-wide dataset, written in the download root
    #[serde(default = "default_global_filename")]
    pub global_filename: String,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            global_enabled: true,
            global_filename: default_global_filename(),
        }
    }
}

impl ConsolidationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.global_enabled {
            if !self.global_filename.ends_with(".csv") || self.global_filename.contains('/') {
                return Err(format!(
                    "consolidation.global_filename must be a bare .csv file name, got '{}'",
                    self.global_filename
                ));
            }
            if self.global_filename.ends_with("_consolidated.csv")
                || self.global_filename.ends_with("_combined.csv")
            {
                return Err(format!(
                    "consolidation.global_filename '{}' would be mistaken for a per-state dataset",
                    self.global_filename
                ));
            }
        }
        Ok(())
    }
}

/// How the run waits for the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointMode {
    /// Block on a console line (interactive runs)
    #[default]
    Prompt,
    /// Wait for a touch file to appear
    File,
    /// Do not wait at all
    None,
}

impl FromStr for CheckpointMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prompt" => Ok(CheckpointMode::Prompt),
            "file" => Ok(CheckpointMode::File),
            "none" => Ok(CheckpointMode::None),
            other => Err(format!(
                "Invalid checkpoint mode '{other}'. Must be one of: prompt, file, none"
            )),
        }
    }
}

/// Operator checkpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    #[serde(default)]
    pub mode: CheckpointMode,

    /// File whose appearance means "logged in, start"
    #[serde(default = "default_ready_file")]
    pub ready_file: PathBuf,

    /// File whose appearance means "done inspecting, shut down"
    #[serde(default = "default_finish_file")]
    pub finish_file: PathBuf,

    /// Poll interval for file checkpoints
    #[serde(default = "default_checkpoint_poll_ms")]
    pub poll_interval_ms: u64,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            mode: CheckpointMode::default(),
            ready_file: default_ready_file(),
            finish_file: default_finish_file(),
            poll_interval_ms: default_checkpoint_poll_ms(),
        }
    }
}

impl CheckpointConfig {
    fn validate(&self) -> Result<(), String> {
        if self.mode == CheckpointMode::File {
            if self.poll_interval_ms == 0 {
                return Err("checkpoints.poll_interval_ms must be > 0".to_string());
            }
            if self.ready_file == self.finish_file {
                return Err("checkpoints.ready_file and finish_file must differ".to_string());
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    120
}

fn default_entry_url() -> String {
    "https://firstsource.cmie.com/kommon/bin/sr.php?kall=wadvsearch".to_string()
}

fn default_raw_filename() -> String {
    "data.csv".to_string()
}

fn default_category_tab() -> String {
    "xpath://a[@class='nav-link' and @href='#category']".to_string()
}

fn default_business_select() -> String {
    "id:nature_of_business".to_string()
}

fn default_location_tab() -> String {
    "xpath://a[@class='nav-link' and @href='#location']".to_string()
}

fn default_state_select() -> String {
    "id:state_name".to_string()
}

fn default_submit() -> String {
    "id:frm_submit".to_string()
}

fn default_export_link() -> String {
    "xpath://a[contains(@id, 'exporttocsv_') and contains(text(), 'Export to CSV')]".to_string()
}

fn default_next_page() -> String {
    "xpath://input[@class='img_but_next']".to_string()
}

fn default_overlay() -> String {
    "css:a.nav-link.dropdown-toggle".to_string()
}

fn default_download_directory() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_tab_timeout_ms() -> u64 {
    10_000
}

fn default_submit_timeout_ms() -> u64 {
    5_000
}

fn default_export_timeout_ms() -> u64 {
    30_000
}

fn default_download_timeout_ms() -> u64 {
    40_000
}

fn default_next_page_timeout_ms() -> u64 {
    30_000
}

fn default_overlay_timeout_ms() -> u64 {
    3_000
}

fn default_staleness_timeout_ms() -> u64 {
    20_000
}

fn default_short_settle_ms() -> u64 {
    2_000
}

fn default_page_settle_ms() -> u64 {
    5_000
}

fn default_scroll_settle_ms() -> u64 {
    1_000
}

fn default_global_filename() -> String {
    "all_states.csv".to_string()
}

fn default_ready_file() -> PathBuf {
    PathBuf::from("harvest.ready")
}

fn default_finish_file() -> PathBuf {
    PathBuf::from("harvest.finish")
}

fn default_checkpoint_poll_ms() -> u64 {
    1_000
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
