//! Three-tier consolidation pipeline
//!
//! - [`combine_pages`] merges one query's page exports into its combined dataset
//! - [`consolidate_state`] merges a filtered state's combined datasets
//! - [`consolidate_global`] merges every state's final dataset into one file
//!
//! All three share [`merge_files`]: read each input leniently, concatenate by
//! column name, write once if at least one row survived. A file that cannot be
//! read is logged and left out; it never stops the merge.

mod pages;

pub use pages::{combine_pages, order_pages, relocate_strays};

use crate::adapters::tabular::{read_table, write_table, Table};
use crate::core::layout::Layout;
use crate::domain::{ConsolidatedDataset, GlobalDataset, Query, Result, StateName};
use crate::log_file_failure;
use std::path::{Path, PathBuf};

/// Result of merging a list of files into one
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Inputs that were read, in merge order
    pub sources: Vec<PathBuf>,
    /// Inputs that could not be read, with the reason
    pub failed: Vec<(PathBuf, String)>,
    /// Data rows in the merged table
    pub rows: usize,
    /// Output path, when something was written
    pub written: Option<PathBuf>,
}

/// Concatenates `inputs` in order and writes the result to `output`
///
/// Nothing is written when the merged table has no rows.
///
/// # Errors
///
/// Only a failure to write `output` is an error; unreadable inputs are
/// reported in [`MergeOutcome::failed`].
pub fn merge_files(inputs: &[PathBuf], output: &Path) -> Result<MergeOutcome> {
    let mut merged = Table::default();
    let mut outcome = MergeOutcome::default();

    for input in inputs {
        match read_table(input) {
            Ok(report) => {
                tracing::debug!(
                    path = %input.display(),
                    rows = report.table.len(),
                    skipped_rows = report.skipped_rows,
                    "Read input"
                );
                merged.append(report.table);
                outcome.sources.push(input.clone());
            }
            Err(e) => {
                log_file_failure!(input, &e);
                outcome.failed.push((input.clone(), e.to_string()));
            }
        }
    }

    outcome.rows = merged.len();
    if merged.is_empty() {
        tracing::info!(
            output = %output.display(),
            inputs = inputs.len(),
            "No rows to write"
        );
        return Ok(outcome);
    }

    write_table(output, &merged)?;
    tracing::info!(
        output = %output.display(),
        sources = outcome.sources.len(),
        rows = outcome.rows,
        "Wrote merged dataset"
    );
    outcome.written = Some(output.to_path_buf());
    Ok(outcome)
}

/// Merges every combined dataset of a filtered state
///
/// Only `*_combined.csv` files inside `{root}/{state}_*` directories are read;
/// raw page files are never touched here.
pub fn consolidate_state(layout: &Layout, state: &StateName) -> Result<Option<ConsolidatedDataset>> {
    let mut inputs = Vec::new();
    for dir in layout.state_query_dirs(state)? {
        inputs.extend(Layout::combined_files_in(&dir)?);
    }

    let output = layout.consolidated_path(state);
    tracing::info!(
        state = %state,
        inputs = inputs.len(),
        output = %output.display(),
        "Consolidating state"
    );

    let outcome = merge_files(&inputs, &output)?;
    Ok(outcome.written.map(|path| ConsolidatedDataset {
        state: state.clone(),
        path,
        sources: outcome.sources,
        rows: outcome.rows,
    }))
}

/// Merges every state's final dataset into `{root}/{file_name}`
///
/// Filtered states contribute their consolidated dataset, unfiltered states
/// their combined dataset, in the order given. States with no dataset on disk
/// are skipped.
pub fn consolidate_global(
    layout: &Layout,
    filtered_states: &[StateName],
    unfiltered_states: &[StateName],
    file_name: &str,
) -> Result<Option<GlobalDataset>> {
    let candidates = filtered_states
        .iter()
        .map(|s| layout.consolidated_path(s))
        .chain(
            unfiltered_states
                .iter()
                .map(|s| layout.combined_path(&Query::unfiltered(s.clone()))),
        );

    let mut inputs = Vec::new();
    for path in candidates {
        if path.is_file() {
            inputs.push(path);
        } else {
            tracing::debug!(path = %path.display(), "No dataset for state");
        }
    }

    let output = layout.global_path(file_name);
    let outcome = merge_files(&inputs, &output)?;
    Ok(outcome.written.map(|path| GlobalDataset {
        path,
        sources: outcome.sources,
        rows: outcome.rows,
    }))
}
