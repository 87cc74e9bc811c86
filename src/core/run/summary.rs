//! Run summary and reporting
//!
//! This module defines structures for tracking and reporting what a run did:
//! how each query ended, which datasets were written, and what went wrong.

use crate::core::session::Termination;
use crate::domain::{HarvestError, Query, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How one query ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The session reached its result pages
    Completed {
        /// Pages captured
        pages: usize,
        termination: Termination,
    },
    /// The query never reached its result pages
    Failed { reason: String },
    /// The query was not attempted
    Skipped { reason: String },
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Completed { pages, termination } => {
                write!(f, "completed ({pages} pages, {termination})")
            }
            QueryOutcome::Failed { reason } => write!(f, "failed: {reason}"),
            QueryOutcome::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// One query's line in the summary
#[derive(Debug, Clone)]
pub struct QueryRecord {
    pub query: Query,
    pub outcome: QueryOutcome,
    pub duration: Duration,
}

/// Which tier of the pipeline produced a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetTier {
    Combined,
    Consolidated,
    Global,
}

impl fmt::Display for DatasetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetTier::Combined => write!(f, "combined"),
            DatasetTier::Consolidated => write!(f, "consolidated"),
            DatasetTier::Global => write!(f, "global"),
        }
    }
}

/// A dataset written during the run
#[derive(Debug, Clone)]
pub struct WrittenDataset {
    pub tier: DatasetTier,
    pub path: PathBuf,
    pub rows: usize,
    /// Hex-encoded SHA-256 of the file as written
    pub sha256: String,
}

/// Type of run error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunErrorType {
    /// Driver or portal failure
    Automation,
    /// A merge could not write its output
    Consolidation,
    /// Operator checkpoint failure
    Signal,
    /// Anything else
    Unknown,
}

impl From<&HarvestError> for RunErrorType {
    fn from(err: &HarvestError) -> Self {
        match err {
            HarvestError::Automation(_) => RunErrorType::Automation,
            HarvestError::Io(_) | HarvestError::Parse(_) => RunErrorType::Consolidation,
            HarvestError::Signal(_) => RunErrorType::Signal,
            _ => RunErrorType::Unknown,
        }
    }
}

/// Run error with context
#[derive(Debug, Clone)]
pub struct RunError {
    pub error_type: RunErrorType,
    pub message: String,
    /// Optional context (e.g. the query or state)
    pub context: Option<String>,
}

impl RunError {
    pub fn new(error_type: RunErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            context: None,
        }
    }

    /// Classifies a domain error
    pub fn from_error(err: &HarvestError) -> Self {
        Self::new(RunErrorType::from(err), err.to_string())
    }

    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }
}

/// Summary of a run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub queries: Vec<QueryRecord>,
    pub datasets: Vec<WrittenDataset>,
    pub errors: Vec<RunError>,
    pub duration: Duration,
    /// A shutdown signal stopped the run between queries
    pub interrupted: bool,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn record_query(&mut self, query: Query, outcome: QueryOutcome, duration: Duration) {
        self.queries.push(QueryRecord {
            query,
            outcome,
            duration,
        });
    }

    /// Records a written dataset, checksumming it
    ///
    /// A checksum failure is recorded as an error instead of the dataset.
    pub fn record_dataset(&mut self, tier: DatasetTier, path: &Path, rows: usize) {
        match file_checksum(path) {
            Ok(sha256) => self.datasets.push(WrittenDataset {
                tier,
                path: path.to_path_buf(),
                rows,
                sha256,
            }),
            Err(e) => self.add_error(
                RunError::from_error(&e).with_context(format!("checksum {}", path.display())),
            ),
        }
    }

    pub fn add_error(&mut self, error: RunError) {
        self.errors.push(error);
    }

    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, QueryOutcome::Completed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, QueryOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, QueryOutcome::Skipped { .. }))
    }

    /// Pages captured across all queries
    pub fn total_pages(&self) -> usize {
        self.queries
            .iter()
            .map(|r| match r.outcome {
                QueryOutcome::Completed { pages, .. } => pages,
                _ => 0,
            })
            .sum()
    }

    /// Datasets written for one tier
    pub fn datasets_of(&self, tier: DatasetTier) -> impl Iterator<Item = &WrittenDataset> {
        self.datasets.iter().filter(move |d| d.tier == tier)
    }

    /// No query failed, nothing errored, and the run was not interrupted
    pub fn is_successful(&self) -> bool {
        self.failed() == 0 && self.errors.is_empty() && !self.interrupted
    }

    fn count(&self, pred: impl Fn(&QueryOutcome) -> bool) -> usize {
        self.queries.iter().filter(|r| pred(&r.outcome)).count()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            queries = self.queries.len(),
            completed = self.completed(),
            failed = self.failed(),
            skipped = self.skipped(),
            pages = self.total_pages(),
            datasets = self.datasets.len(),
            interrupted = self.interrupted,
            duration_secs = self.duration.as_secs(),
            "Run finished"
        );

        for record in &self.queries {
            if let QueryOutcome::Failed { reason } = &record.outcome {
                tracing::warn!(query = %record.query, reason = %reason, "Query failed");
            }
        }

        for error in &self.errors {
            tracing::warn!(
                error_type = ?error.error_type,
                message = %error.message,
                context = error.context.as_deref().unwrap_or(""),
                "Run error"
            );
        }
    }
}

/// Hex-encoded SHA-256 of a file's bytes
pub fn file_checksum(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| HarvestError::io_at(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| HarvestError::io_at(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
