//! Write-once file artifacts produced by a run
//!
//! None of these are ever updated or deleted by Harvest; each value describes
//! a file that exists on disk at the time it was built.

use super::ids::StateName;
use super::query::Query;
use chrono::NaiveDateTime;
use std::path::PathBuf;

/// One page's export, relocated under its canonical name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageArtifact {
    /// Query the page belongs to
    pub query: Query,

    /// 1-based page number
    pub page_number: u32,

    /// Canonical location of the file
    pub path: PathBuf,

    /// Capture instant encoded in the name (unfiltered queries only)
    pub captured_at: Option<NaiveDateTime>,
}

impl PageArtifact {
    /// Creates a page artifact, rejecting page number zero
    pub fn new(query: Query, page_number: u32, path: PathBuf) -> Result<Self, String> {
        if page_number == 0 {
            return Err(format!(
                "Page numbers start at 1, got 0 for {}",
                path.display()
            ));
        }
        Ok(Self {
            query,
            page_number,
            path,
            captured_at: None,
        })
    }

    /// Records the capture instant
    pub fn with_captured_at(mut self, captured_at: NaiveDateTime) -> Self {
        self.captured_at = Some(captured_at);
        self
    }
}

/// Concatenation of every page of one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedDataset {
    pub query: Query,
    pub path: PathBuf,
    /// Pages in the order their rows appear in the output
    pub sources: Vec<PageArtifact>,
    /// Number of data rows written (header excluded)
    pub rows: usize,
}

/// Merge of every combined dataset of one state, across business types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedDataset {
    pub state: StateName,
    pub path: PathBuf,
    /// Combined files that contributed rows, in merge order
    pub sources: Vec<PathBuf>,
    pub rows: usize,
}

/// Run-wide merge of every state's final dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalDataset {
    pub path: PathBuf,
    pub sources: Vec<PathBuf>,
    pub rows: usize,
}
