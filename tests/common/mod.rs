//! Shared fixtures for integration tests
//!
//! [`FakePortal`] stands in for the browser: it serves every configured
//! control, writes a two-row raw export when the export link is clicked, and
//! offers a next-page control until the configured page count is reached.
//! Overlays and intercepted clicks can be switched on per test.

#![allow(dead_code)]

use async_trait::async_trait;
use harvest::adapters::automation::{Automation, Control, Selector};
use harvest::config::{PortalSelectors, SelectorConfig, TimingConfig};
use harvest::core::layout::Layout;
use harvest::core::RunContext;
use harvest::domain::{AutomationError, HarvestError, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub const RAW_FILENAME: &str = "data.csv";
pub const ENTRY_URL: &str = "https://portal.example.com/search";

/// Waits short enough to keep tests fast, long enough to poll a few times
pub fn fast_timing() -> TimingConfig {
    TimingConfig {
        poll_interval_ms: 1,
        tab_timeout_ms: 200,
        select_timeout_ms: 200,
        submit_timeout_ms: 200,
        export_timeout_ms: 200,
        download_timeout_ms: 200,
        next_page_timeout_ms: 20,
        overlay_timeout_ms: 5,
        staleness_timeout_ms: 200,
        navigation_settle_ms: 0,
        selection_settle_ms: 0,
        page_settle_ms: 0,
        scroll_settle_ms: 0,
    }
}

pub fn selectors() -> PortalSelectors {
    SelectorConfig::default().parse().unwrap()
}

pub fn context(root: &Path, portal: Arc<FakePortal>) -> RunContext {
    RunContext {
        automation: portal,
        layout: Layout::new(root),
        selectors: selectors(),
        timing: fast_timing(),
        entry_url: ENTRY_URL.to_string(),
        raw_filename: RAW_FILENAME.to_string(),
    }
}

/// Reads a CSV file's data lines (header dropped)
pub fn data_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

/// First cell of every data line
pub fn companies(path: &Path) -> Vec<String> {
    data_lines(path)
        .into_iter()
        .map(|line| line.split(',').next().unwrap_or_default().to_string())
        .collect()
}

/// Company names the fake writes for one page
pub fn page_companies(stem: &str, page: u32) -> Vec<String> {
    (1..=2).map(|row| format!("{stem}-p{page}-r{row}")).collect()
}

#[derive(Default)]
struct PortalState {
    /// Bumped on every navigation; controls from older documents are stale
    document: u32,
    state: Option<String>,
    business_type: Option<String>,
    page: u32,
    total_pages: u32,
    navigations: u32,
    exports: u32,
    shutdowns: u32,
    overlay_dismissed: bool,
    overlay_clicks: u32,
    forced_clicks: u32,
    selected: Vec<(String, Option<String>)>,
}

/// Scripted portal behind the `Automation` trait
pub struct FakePortal {
    download_dir: PathBuf,
    selectors: PortalSelectors,
    pages: HashMap<(String, Option<String>), u32>,
    missing_options: HashSet<String>,
    fail_entry_navigation: bool,
    overlay: bool,
    intercept_next_page: bool,
    trip_shutdown: Option<(u32, watch::Sender<bool>)>,
    inner: Mutex<PortalState>,
}

impl FakePortal {
    pub fn new(download_dir: &Path) -> Self {
        Self {
            download_dir: download_dir.to_path_buf(),
            selectors: selectors(),
            pages: HashMap::new(),
            missing_options: HashSet::new(),
            fail_entry_navigation: false,
            overlay: false,
            intercept_next_page: false,
            trip_shutdown: None,
            inner: Mutex::new(PortalState::default()),
        }
    }

    /// Number of result pages for a query (1 when not set)
    pub fn with_pages(mut self, state: &str, business_type: Option<&str>, pages: u32) -> Self {
        self.pages.insert(
            (state.to_string(), business_type.map(str::to_string)),
            pages,
        );
        self
    }

    /// A dropdown label the portal does not offer
    pub fn without_option(mut self, label: &str) -> Self {
        self.missing_options.insert(label.to_string());
        self
    }

    /// Every navigation fails
    pub fn unreachable(mut self) -> Self {
        self.fail_entry_navigation = true;
        self
    }

    /// Every results page shows an overlay until it is clicked
    pub fn with_overlay(mut self) -> Self {
        self.overlay = true;
        self
    }

    /// Native clicks on the next-page control are intercepted; only a forced
    /// click goes through
    pub fn intercept_next_page_clicks(mut self) -> Self {
        self.intercept_next_page = true;
        self
    }

    /// Raises the shutdown flag on the given navigation (1-based)
    pub fn trip_shutdown_on_navigation(mut self, nth: u32, tx: watch::Sender<bool>) -> Self {
        self.trip_shutdown = Some((nth, tx));
        self
    }

    pub fn exports(&self) -> u32 {
        self.inner.lock().unwrap().exports
    }

    pub fn navigations(&self) -> u32 {
        self.inner.lock().unwrap().navigations
    }

    pub fn shutdowns(&self) -> u32 {
        self.inner.lock().unwrap().shutdowns
    }

    pub fn overlay_clicks(&self) -> u32 {
        self.inner.lock().unwrap().overlay_clicks
    }

    pub fn forced_clicks(&self) -> u32 {
        self.inner.lock().unwrap().forced_clicks
    }

    /// (state, business type) of every submitted search, in order
    pub fn submitted(&self) -> Vec<(String, Option<String>)> {
        self.inner.lock().unwrap().selected.clone()
    }

    fn control(&self, name: &str, selector: &Selector, document: u32) -> Control {
        Control::new(format!("{name}@{document}"), selector.clone())
    }

    fn document_of(control: &Control) -> u32 {
        control
            .element_id()
            .rsplit('@')
            .next()
            .and_then(|d| d.parse().ok())
            .unwrap_or(0)
    }

    fn press(&self, control: &Control, forced: bool) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        if Self::document_of(control) != state.document {
            return Err(AutomationError::StaleControl(control.to_string()).into());
        }

        let s = &self.selectors;
        let selector = control.selector();
        if selector == &s.overlay {
            state.overlay_dismissed = true;
            state.overlay_clicks += 1;
        } else if selector == &s.submit {
            let key = (
                state.state.clone().unwrap_or_default(),
                state.business_type.clone(),
            );
            state.total_pages = self.pages.get(&key).copied().unwrap_or(1);
            state.page = 1;
            state.document += 1;
            state.overlay_dismissed = false;
            state.selected.push(key);
        } else if selector == &s.export_link {
            self.write_raw_export(&state)?;
            state.exports += 1;
        } else if selector == &s.next_page {
            if self.intercept_next_page && !forced {
                return Err(AutomationError::ClickIntercepted(
                    "overlay receives the click".to_string(),
                )
                .into());
            }
            if forced {
                state.forced_clicks += 1;
            }
            state.page += 1;
            state.document += 1;
            state.overlay_dismissed = false;
        }
        Ok(())
    }

    fn write_raw_export(&self, state: &PortalState) -> Result<()> {
        let label = state.state.clone().unwrap_or_default();
        let bt = state.business_type.clone().unwrap_or_default();
        let stem = if bt.is_empty() {
            label.clone()
        } else {
            format!("{label}/{bt}")
        };

        let mut body = String::from("company,state,business_type,page\n");
        for company in page_companies(&stem, state.page) {
            body.push_str(&format!(
                "{company},\"{label}\",\"{bt}\",{}\n",
                state.page
            ));
        }
        let raw = self.download_dir.join(RAW_FILENAME);
        fs::write(&raw, body).map_err(|e| HarvestError::io_at(&raw, e))
    }
}

#[async_trait]
impl Automation for FakePortal {
    async fn navigate(&self, _url: &str) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        state.navigations += 1;
        if let Some((nth, tx)) = &self.trip_shutdown {
            if state.navigations == *nth {
                let _ = tx.send(true);
            }
        }
        if self.fail_entry_navigation {
            return Err(AutomationError::ConnectionFailed("portal unreachable".into()).into());
        }
        state.document += 1;
        state.state = None;
        state.business_type = None;
        state.page = 0;
        state.total_pages = 0;
        Ok(())
    }

    async fn find_control(&self, selector: &Selector) -> Result<Option<Control>> {
        let state = self.inner.lock().unwrap();
        let s = &self.selectors;
        if selector == &s.overlay {
            if !self.overlay || state.page == 0 || state.overlay_dismissed {
                return Ok(None);
            }
            return Ok(Some(self.control("overlay", selector, state.document)));
        }
        if selector == &s.next_page {
            if state.page == 0 || state.page >= state.total_pages {
                return Ok(None);
            }
            return Ok(Some(self.control("next", selector, state.document)));
        }
        if selector == &s.export_link && state.page == 0 {
            return Ok(None);
        }
        Ok(Some(self.control("control", selector, state.document)))
    }

    async fn is_displayed(&self, _control: &Control) -> Result<bool> {
        Ok(true)
    }

    async fn is_enabled(&self, _control: &Control) -> Result<bool> {
        Ok(true)
    }

    async fn click(&self, control: &Control) -> Result<()> {
        self.press(control, false)
    }

    async fn force_click(&self, control: &Control) -> Result<()> {
        self.press(control, true)
    }

    async fn scroll_into_view(&self, _control: &Control) -> Result<()> {
        Ok(())
    }

    async fn select_option(&self, control: &Control, visible_label: &str) -> Result<()> {
        if self.missing_options.contains(visible_label) {
            return Err(AutomationError::OptionNotFound {
                control: control.to_string(),
                label: visible_label.to_string(),
            }
            .into());
        }

        let mut state = self.inner.lock().unwrap();
        let s = &self.selectors;
        if control.selector() == &s.state_select {
            state.state = Some(visible_label.to_string());
        } else if control.selector() == &s.business_select {
            state.business_type = Some(visible_label.to_string());
        }
        Ok(())
    }

    async fn is_stale(&self, control: &Control) -> Result<bool> {
        let state = self.inner.lock().unwrap();
        Ok(Self::document_of(control) != state.document)
    }

    async fn shutdown(&self) -> Result<()> {
        self.inner.lock().unwrap().shutdowns += 1;
        Ok(())
    }
}
