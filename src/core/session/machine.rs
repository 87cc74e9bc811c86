//! Export-and-paginate state machine for one query

use super::wait::{Readiness, Waiter};
use crate::adapters::automation::{Control, Selector};
use crate::core::context::{ms, RunContext};
use crate::domain::{AutomationError, HarvestError, PageArtifact, Query, Result};
use chrono::{Local, NaiveDateTime, Timelike};
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::Instrument;

/// Where a session is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Setup,
    AwaitingExport,
    Renaming,
    AwaitingNextPage,
    Terminated(Termination),
}

/// Why a session stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The next-page control was missing or the page never navigated
    NoNextPage,
    /// The export control never became clickable on the current page
    ExportUnavailable,
    /// The raw export never appeared on disk
    DownloadMissing,
    /// A selection or submission step failed; no page was visited
    SetupFailed(String),
    /// An unexpected driver or I/O failure after setup
    Aborted(String),
}

impl Termination {
    /// True when the query never reached its result pages
    pub fn is_failure(&self) -> bool {
        matches!(self, Termination::SetupFailed(_))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::NoNextPage => write!(f, "no next page"),
            Termination::ExportUnavailable => write!(f, "export unavailable"),
            Termination::DownloadMissing => write!(f, "download did not appear"),
            Termination::SetupFailed(reason) => write!(f, "setup failed: {reason}"),
            Termination::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}

/// Result of trying to move to the next results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationOutcome {
    /// The page navigated; carries the control that was activated
    Continue(Control),
    /// There is no further page
    Exhausted,
}

enum ExportStep {
    Downloaded,
    Ended(Termination),
}

/// What a finished session hands back to the orchestrator
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub query: Query,
    /// Pages captured, in capture order
    pub artifacts: Vec<PageArtifact>,
    /// Number of export attempts that produced a raw file
    pub exports: u32,
    pub termination: Termination,
    pub duration: Duration,
}

/// Drives one query through the portal
///
/// The caller navigates to the entry page first. [`ExportSession::run`] never
/// fails: every error is caught here and becomes a [`Termination`].
pub struct ExportSession<'a> {
    ctx: &'a RunContext,
    query: Query,
    page_number: u32,
    next_control: Option<Control>,
    state: SessionState,
    artifacts: Vec<PageArtifact>,
    exports: u32,
}

impl<'a> ExportSession<'a> {
    pub fn new(ctx: &'a RunContext, query: Query) -> Self {
        Self {
            ctx,
            query,
            page_number: 1,
            next_control: None,
            state: SessionState::Setup,
            artifacts: Vec::new(),
            exports: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current 1-based page number
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Last next-page control that was activated
    pub fn next_control(&self) -> Option<&Control> {
        self.next_control.as_ref()
    }

    /// Runs the session to termination inside a span naming the query
    pub async fn run(mut self) -> SessionReport {
        let span = tracing::info_span!(
            "query",
            state = %self.query.state(),
            business_type = self.query.business_type().map(|bt| bt.as_str()).unwrap_or("-"),
        );
        let started = std::time::Instant::now();

        let termination = self.drive().instrument(span).await;

        SessionReport {
            query: self.query,
            artifacts: self.artifacts,
            exports: self.exports,
            termination,
            duration: started.elapsed(),
        }
    }

    async fn drive(&mut self) -> Termination {
        self.state = SessionState::Setup;
        if let Err(e) = self.setup().await {
            tracing::warn!(error = %e, "Query setup failed");
            return self.terminate(Termination::SetupFailed(e.to_string()));
        }

        loop {
            self.state = SessionState::AwaitingExport;
            match self.trigger_export().await {
                Ok(ExportStep::Downloaded) => self.exports += 1,
                Ok(ExportStep::Ended(termination)) => return self.terminate(termination),
                Err(e) => {
                    tracing::warn!(error = %e, page = self.page_number, "Export failed");
                    return self.terminate(Termination::Aborted(e.to_string()));
                }
            }

            self.state = SessionState::Renaming;
            if let Some(artifact) = self.capture_page() {
                self.artifacts.push(artifact);
            }

            self.state = SessionState::AwaitingNextPage;
            match self.advance().await {
                PaginationOutcome::Continue(control) => self.next_control = Some(control),
                PaginationOutcome::Exhausted => return self.terminate(Termination::NoNextPage),
            }
        }
    }

    fn terminate(&mut self, termination: Termination) -> Termination {
        tracing::info!(
            page = self.page_number,
            captured = self.artifacts.len(),
            reason = %termination,
            "Session terminated"
        );
        self.state = SessionState::Terminated(termination.clone());
        termination
    }

    fn waiter(&self) -> Waiter<'a> {
        let ctx = self.ctx;
        Waiter::new(ctx.automation.as_ref(), ctx.poll_interval())
    }

    async fn settle(&self, millis: u64) {
        if millis > 0 {
            sleep(ms(millis)).await;
        }
    }

    /// Selects business type (when present) and state, then submits
    async fn setup(&self) -> Result<()> {
        let ctx = self.ctx;
        let timing = &ctx.timing;
        let selectors = &ctx.selectors;
        let automation = ctx.automation.as_ref();
        let waiter = self.waiter();

        self.quarantine_leftover_raw()?;

        if let Some(bt) = self.query.business_type() {
            let tab = waiter
                .for_control(
                    &selectors.category_tab,
                    Readiness::Clickable,
                    ms(timing.tab_timeout_ms),
                )
                .await?;
            automation.click(&tab).await?;
            self.settle(timing.selection_settle_ms).await;

            let select = waiter
                .for_control(
                    &selectors.business_select,
                    Readiness::Present,
                    ms(timing.select_timeout_ms),
                )
                .await?;
            automation.select_option(&select, bt.as_str()).await?;
            tracing::debug!(business_type = %bt, "Selected business type");
            self.settle(timing.selection_settle_ms).await;

            let tab = waiter
                .for_control(
                    &selectors.location_tab,
                    Readiness::Clickable,
                    ms(timing.tab_timeout_ms),
                )
                .await?;
            automation.click(&tab).await?;
            self.settle(timing.selection_settle_ms).await;
        }

        let select = waiter
            .for_control(
                &selectors.state_select,
                Readiness::Present,
                ms(timing.select_timeout_ms),
            )
            .await?;
        automation
            .select_option(&select, self.query.state().as_str())
            .await?;
        tracing::debug!(state = %self.query.state(), "Selected state");
        self.settle(timing.selection_settle_ms).await;

        let submit = waiter
            .for_control(
                &selectors.submit,
                Readiness::Clickable,
                ms(timing.submit_timeout_ms),
            )
            .await?;
        automation.click(&submit).await?;
        tracing::info!("Search submitted");
        Ok(())
    }

    /// Moves a raw export left over from an earlier run out of the way, so it
    /// cannot be mistaken for this query's first page
    fn quarantine_leftover_raw(&self) -> Result<()> {
        let raw = self.ctx.layout.raw_download_path(&self.ctx.raw_filename);
        if !raw.exists() {
            return Ok(());
        }
        let aside = raw.with_file_name(format!(
            "{}.{}.orphan",
            self.ctx.raw_filename,
            Local::now().format("%Y%m%d%H%M%S%3f")
        ));
        std::fs::rename(&raw, &aside).map_err(|e| HarvestError::io_at(&raw, e))?;
        tracing::warn!(
            from = %raw.display(),
            to = %aside.display(),
            "Moved leftover raw export aside"
        );
        Ok(())
    }

    /// Clicks the export control and waits for the raw file
    async fn trigger_export(&self) -> Result<ExportStep> {
        let timing = &self.ctx.timing;
        self.settle(timing.page_settle_ms).await;

        let waiter = self.waiter();
        let export = match waiter
            .for_control(
                &self.ctx.selectors.export_link,
                Readiness::Clickable,
                ms(timing.export_timeout_ms),
            )
            .await
        {
            Ok(control) => control,
            Err(e) if e.is_pagination_end() => {
                tracing::info!(page = self.page_number, "Export control not available");
                return Ok(ExportStep::Ended(Termination::ExportUnavailable));
            }
            Err(e) => return Err(e),
        };

        self.activate(&export).await?;
        tracing::debug!(page = self.page_number, "Export requested");

        let raw = self.ctx.layout.raw_download_path(&self.ctx.raw_filename);
        match waiter.for_file(&raw, ms(timing.download_timeout_ms)).await {
            Ok(()) => Ok(ExportStep::Downloaded),
            Err(e) if e.is_pagination_end() => {
                tracing::info!(page = self.page_number, path = %raw.display(), "Raw export did not appear");
                Ok(ExportStep::Ended(Termination::DownloadMissing))
            }
            Err(e) => Err(e),
        }
    }

    /// Renames the raw export to its canonical name inside the query directory
    ///
    /// Failures are logged and the page is skipped; the session carries on.
    fn capture_page(&mut self) -> Option<PageArtifact> {
        let raw = self.ctx.layout.raw_download_path(&self.ctx.raw_filename);
        if !raw.exists() {
            tracing::warn!(page = self.page_number, path = %raw.display(), "Raw export vanished before rename");
            return None;
        }

        let captured_at = capture_instant();
        let result = self
            .ctx
            .layout
            .ensure_query_dir(&self.query)
            .and_then(|_| {
                let target = self
                    .ctx
                    .layout
                    .page_target(&self.query, self.page_number, captured_at);
                if target.exists() {
                    tracing::warn!(path = %target.display(), "Replacing existing page export");
                }
                std::fs::rename(&raw, &target)
                    .map(|_| target)
                    .map_err(|e| HarvestError::io_at(&raw, e))
            });

        match result {
            Ok(path) => {
                tracing::info!(page = self.page_number, path = %path.display(), "Page captured");
                let artifact = match PageArtifact::new(self.query.clone(), self.page_number, path) {
                    Ok(a) => a,
                    Err(e) => {
                        tracing::warn!(error = %e, "Page captured without an artifact");
                        return None;
                    }
                };
                Some(if self.query.is_filtered() {
                    artifact
                } else {
                    artifact.with_captured_at(captured_at)
                })
            }
            Err(e) => {
                tracing::warn!(page = self.page_number, error = %e, "Could not rename raw export");
                None
            }
        }
    }

    /// Activates the next-page control and waits for the page to navigate
    ///
    /// Any failure here means there is no further page.
    pub async fn advance(&mut self) -> PaginationOutcome {
        match self.try_advance().await {
            Ok(control) => {
                self.page_number += 1;
                tracing::debug!(page = self.page_number, "Advanced to next page");
                PaginationOutcome::Continue(control)
            }
            Err(e) => {
                if e.is_pagination_end() {
                    tracing::debug!(reason = %e, "No further page");
                } else {
                    tracing::warn!(error = %e, "Pagination stopped by an unexpected error");
                }
                PaginationOutcome::Exhausted
            }
        }
    }

    async fn try_advance(&self) -> Result<Control> {
        let timing = &self.ctx.timing;
        let automation = self.ctx.automation.as_ref();
        let waiter = self.waiter();

        let next = waiter
            .for_control(
                &self.ctx.selectors.next_page,
                Readiness::Clickable,
                ms(timing.next_page_timeout_ms),
            )
            .await?;

        automation.scroll_into_view(&next).await?;
        self.settle(timing.scroll_settle_ms).await;

        self.dismiss_overlay(&self.ctx.selectors.overlay).await;

        self.activate(&next).await?;
        waiter
            .until_stale(&next, ms(timing.staleness_timeout_ms))
            .await?;
        Ok(next)
    }

    /// Clicks a transient overlay if one shows up within the overlay timeout
    ///
    /// Absence is success. A failed click is logged and ignored.
    async fn dismiss_overlay(&self, overlay: &Selector) -> bool {
        let timing = &self.ctx.timing;
        let waiter = self.waiter();

        match waiter
            .for_control(overlay, Readiness::Visible, ms(timing.overlay_timeout_ms))
            .await
        {
            Ok(control) => {
                if let Err(e) = self.ctx.automation.click(&control).await {
                    tracing::debug!(error = %e, "Overlay click failed");
                    return false;
                }
                tracing::debug!("Overlay dismissed");
                self.settle(timing.scroll_settle_ms).await;
                true
            }
            Err(_) => false,
        }
    }

    /// Native click, falling back to a forced click when something covers the
    /// control
    async fn activate(&self, control: &Control) -> Result<()> {
        let automation = self.ctx.automation.as_ref();
        match automation.click(control).await {
            Err(HarvestError::Automation(AutomationError::ClickIntercepted(reason))) => {
                tracing::debug!(control = %control, reason = %reason, "Click intercepted, forcing");
                automation.force_click(control).await
            }
            other => other,
        }
    }
}

fn capture_instant() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
