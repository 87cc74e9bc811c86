//! Run coordinator - main orchestrator for a harvest run
//!
//! Sequences every query through the export session, combines each query's
//! pages as soon as it finishes, consolidates each filtered state once all of
//! its business types are done, and finally merges every state into the
//! run-wide dataset.

use super::summary::{DatasetTier, QueryOutcome, RunError, RunErrorType, RunSummary};
use crate::adapters::automation::Automation;
use crate::config::{ConsolidationConfig, HarvestConfig, QueryConfig};
use crate::core::checkpoint::OperatorSignal;
use crate::core::consolidate::{combine_pages, consolidate_global, consolidate_state};
use crate::core::context::{ms, RunContext};
use crate::core::layout::Layout;
use crate::core::session::ExportSession;
use crate::domain::{Query, Result, StateName};
use crate::{log_error_with_context, log_query_complete, log_query_start};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Run coordinator
pub struct RunCoordinator {
    ctx: RunContext,
    queries: QueryConfig,
    consolidation: ConsolidationConfig,
    signal: Box<dyn OperatorSignal>,
    shutdown_signal: watch::Receiver<bool>,
}

impl RunCoordinator {
    pub fn new(
        ctx: RunContext,
        queries: QueryConfig,
        consolidation: ConsolidationConfig,
        signal: Box<dyn OperatorSignal>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Self {
        Self {
            ctx,
            queries,
            consolidation,
            signal,
            shutdown_signal,
        }
    }

    /// Builds a coordinator from validated configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a selector cannot be parsed.
    pub fn from_config(
        config: &HarvestConfig,
        automation: Arc<dyn Automation>,
        signal: Box<dyn OperatorSignal>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Result<Self> {
        Ok(Self::new(
            RunContext::from_config(config, automation)?,
            config.queries.clone(),
            config.consolidation.clone(),
            signal,
            shutdown_signal,
        ))
    }

    /// Execute the run
    ///
    /// 1. Prepare the download root and open the portal's entry page
    /// 2. Wait for the operator's ready signal
    /// 3. For each filtered state: every business type, then consolidate
    /// 4. For each unfiltered state: one unfiltered query
    /// 5. Merge everything into the run-wide dataset
    /// 6. Wait for the operator's finish signal and close the browser
    ///
    /// # Errors
    ///
    /// Only run-wide failures are errors: the download root cannot be
    /// created, the entry page cannot be reached, or the ready signal fails.
    /// The browser is shut down before any of them is returned.
    pub async fn execute(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::new();

        tracing::info!(
            root = %self.ctx.layout.root().display(),
            queries = self.queries.queries().len(),
            "Starting harvest run"
        );

        if let Err(e) = self.open_portal().await {
            log_error_with_context!(&e, "Run aborted before the first query");
            self.close_browser().await;
            return Err(e);
        }

        let total = self.queries.queries().len();
        let mut position = 0;

        'states: for state in &self.queries.filtered_states {
            for bt in &self.queries.business_types {
                if self.shutdown_requested() {
                    summary.interrupted = true;
                    break 'states;
                }

                let query = Query::filtered(state.clone(), bt.clone());
                if self.queries.is_excluded(state, bt) {
                    tracing::info!(query = %query, "Skipping excluded query");
                    summary.record_query(
                        query,
                        QueryOutcome::Skipped {
                            reason: "excluded by configuration".to_string(),
                        },
                        std::time::Duration::ZERO,
                    );
                    continue;
                }

                position += 1;
                self.run_query(query, position, total, &mut summary).await;
            }

            self.consolidate_state(state, &mut summary);
        }

        if !summary.interrupted {
            for state in &self.queries.unfiltered_states {
                if self.shutdown_requested() {
                    summary.interrupted = true;
                    break;
                }
                position += 1;
                self.run_query(Query::unfiltered(state.clone()), position, total, &mut summary)
                    .await;
            }
        }

        if summary.interrupted {
            tracing::warn!("Shutdown requested, stopping before the next query");
        } else {
            if self.consolidation.global_enabled {
                self.consolidate_global(&mut summary);
            }
            if let Err(e) = self.signal.wait_finish().await {
                summary.add_error(
                    RunError::from_error(&e).with_context("finish checkpoint".to_string()),
                );
            }
        }

        self.close_browser().await;

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    async fn open_portal(&self) -> Result<()> {
        Layout::ensure_dir(self.ctx.layout.root())?;
        self.ctx.automation.navigate(&self.ctx.entry_url).await?;
        tracing::info!(url = %self.ctx.entry_url, "Portal entry page opened");
        self.signal.wait_ready().await
    }

    async fn close_browser(&self) {
        if let Err(e) = self.ctx.automation.shutdown().await {
            tracing::warn!(error = %e, "Browser shutdown failed");
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown_signal.borrow()
    }

    /// Runs one query and combines its pages; never fails the run
    async fn run_query(
        &self,
        query: Query,
        position: usize,
        total: usize,
        summary: &mut RunSummary,
    ) {
        let started = Instant::now();
        log_query_start!(&query, position, total);

        if let Err(e) = self.ctx.automation.navigate(&self.ctx.entry_url).await {
            tracing::warn!(query = %query, error = %e, "Could not return to the entry page");
            summary.add_error(RunError::from_error(&e).with_context(query.to_string()));
            summary.record_query(
                query,
                QueryOutcome::Failed {
                    reason: e.to_string(),
                },
                started.elapsed(),
            );
            return;
        }
        tokio::time::sleep(ms(self.ctx.timing.navigation_settle_ms)).await;

        let report = ExportSession::new(&self.ctx, query.clone()).run().await;
        log_query_complete!(&query, report.artifacts.len(), report.termination, report.duration);

        if report.termination.is_failure() {
            summary.record_query(
                query,
                QueryOutcome::Failed {
                    reason: report.termination.to_string(),
                },
                started.elapsed(),
            );
            return;
        }

        combine_into(&self.ctx.layout, &query, summary);

        summary.record_query(
            query,
            QueryOutcome::Completed {
                pages: report.artifacts.len(),
                termination: report.termination,
            },
            started.elapsed(),
        );
    }

    fn consolidate_state(&self, state: &StateName, summary: &mut RunSummary) {
        consolidate_state_into(&self.ctx.layout, state, summary);
    }

    fn consolidate_global(&self, summary: &mut RunSummary) {
        consolidate_global_into(
            &self.ctx.layout,
            &self.queries,
            &self.consolidation.global_filename,
            summary,
        );
    }
}

/// Re-runs every consolidation tier over files already on disk
///
/// No browser is involved; the plan decides which queries and states are
/// visited. Used by the `combine` command.
pub fn rebuild_datasets(
    layout: &Layout,
    queries: &QueryConfig,
    consolidation: &ConsolidationConfig,
) -> RunSummary {
    let start_time = Instant::now();
    let mut summary = RunSummary::new();

    for state in &queries.filtered_states {
        for bt in &queries.business_types {
            if queries.is_excluded(state, bt) {
                continue;
            }
            combine_into(layout, &Query::filtered(state.clone(), bt.clone()), &mut summary);
        }
        consolidate_state_into(layout, state, &mut summary);
    }

    for state in &queries.unfiltered_states {
        combine_into(layout, &Query::unfiltered(state.clone()), &mut summary);
    }

    if consolidation.global_enabled {
        consolidate_global_into(layout, queries, &consolidation.global_filename, &mut summary);
    }

    summary.with_duration(start_time.elapsed())
}

fn combine_into(layout: &Layout, query: &Query, summary: &mut RunSummary) {
    match combine_pages(layout, query) {
        Ok(Some(dataset)) => {
            summary.record_dataset(DatasetTier::Combined, &dataset.path, dataset.rows)
        }
        Ok(None) => tracing::info!(query = %query, "Nothing to combine"),
        Err(e) => summary.add_error(
            RunError::new(RunErrorType::Consolidation, e.to_string())
                .with_context(query.to_string()),
        ),
    }
}

fn consolidate_state_into(layout: &Layout, state: &StateName, summary: &mut RunSummary) {
    match consolidate_state(layout, state) {
        Ok(Some(dataset)) => {
            summary.record_dataset(DatasetTier::Consolidated, &dataset.path, dataset.rows)
        }
        Ok(None) => tracing::info!(state = %state, "Nothing to consolidate"),
        Err(e) => summary.add_error(
            RunError::new(RunErrorType::Consolidation, e.to_string())
                .with_context(state.to_string()),
        ),
    }
}

fn consolidate_global_into(
    layout: &Layout,
    queries: &QueryConfig,
    file_name: &str,
    summary: &mut RunSummary,
) {
    match consolidate_global(
        layout,
        &queries.filtered_states,
        &queries.unfiltered_states,
        file_name,
    ) {
        Ok(Some(dataset)) => {
            summary.record_dataset(DatasetTier::Global, &dataset.path, dataset.rows)
        }
        Ok(None) => tracing::info!("Nothing to merge into the run-wide dataset"),
        Err(e) => summary.add_error(
            RunError::new(RunErrorType::Consolidation, e.to_string())
                .with_context("global".to_string()),
        ),
    }
}
