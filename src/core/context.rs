//! Explicit run context handed to every component

use crate::adapters::automation::Automation;
use crate::config::{HarvestConfig, PortalSelectors, TimingConfig};
use crate::core::layout::Layout;
use crate::domain::{HarvestError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Everything a session needs: the single automation handle, the download
/// root, the parsed UI anchors and the wait budget
#[derive(Clone)]
pub struct RunContext {
    pub automation: Arc<dyn Automation>,
    pub layout: Layout,
    pub selectors: PortalSelectors,
    pub timing: TimingConfig,
    pub entry_url: String,
    pub raw_filename: String,
}

impl RunContext {
    /// Builds a context from validated configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a selector cannot be parsed.
    pub fn from_config(config: &HarvestConfig, automation: Arc<dyn Automation>) -> Result<Self> {
        let selectors = config
            .portal
            .selectors
            .parse()
            .map_err(HarvestError::Configuration)?;

        Ok(Self {
            automation,
            layout: Layout::new(&config.download.directory),
            selectors,
            timing: config.timing.clone(),
            entry_url: config.portal.entry_url.clone(),
            raw_filename: config.portal.raw_filename.clone(),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.timing.poll_interval()
    }
}

/// Milliseconds from configuration as a `Duration`
pub(crate) fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}
