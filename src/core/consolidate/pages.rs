//! Page-combine: one query's page exports into its combined dataset

use super::merge_files;
use crate::core::layout::{Layout, PageFile, PageKey};
use crate::domain::{CombinedDataset, HarvestError, PageArtifact, Query, Result};
use crate::log_file_failure;
use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

/// Moves page exports of `query` left in the download root into its directory
///
/// Returns the number of files moved. A file that cannot be moved is logged
/// and left where it is.
pub fn relocate_strays(layout: &Layout, query: &Query) -> Result<usize> {
    let strays = layout.stray_page_files(query)?;
    if strays.is_empty() {
        return Ok(0);
    }

    let dir = layout.ensure_query_dir(query)?;
    let mut moved = 0;
    for stray in strays {
        let Some(name) = stray.path.file_name() else {
            continue;
        };
        let target = dir.join(name);
        match fs::rename(&stray.path, &target) {
            Ok(()) => {
                tracing::info!(
                    from = %stray.path.display(),
                    to = %target.display(),
                    "Relocated stray page export"
                );
                moved += 1;
            }
            Err(e) => {
                log_file_failure!(stray.path, &HarvestError::io_at(&stray.path, e));
            }
        }
    }
    Ok(moved)
}

/// Sorts page files into merge order
///
/// Page-numbered files go in ascending page order. Timestamped files go most
/// recent first: capture timestamp, then collision sequence, then modification
/// time, all descending, with the file name as the final tie-break.
pub fn order_pages(pages: &mut [PageFile]) {
    let mut keyed: Vec<(Option<SystemTime>, PageFile)> = pages
        .iter()
        .cloned()
        .map(|p| (fs::metadata(&p.path).and_then(|m| m.modified()).ok(), p))
        .collect();

    keyed.sort_by(|(a_mtime, a), (b_mtime, b)| match (a.key, b.key) {
        (PageKey::Page(x), PageKey::Page(y)) => x.cmp(&y),
        (
            PageKey::Captured { at: a_at, seq: a_seq },
            PageKey::Captured { at: b_at, seq: b_seq },
        ) => b_at
            .cmp(&a_at)
            .then(b_seq.cmp(&a_seq))
            .then(b_mtime.cmp(a_mtime))
            .then_with(|| a.path.cmp(&b.path)),
        (PageKey::Page(_), PageKey::Captured { .. }) => Ordering::Less,
        (PageKey::Captured { .. }, PageKey::Page(_)) => Ordering::Greater,
    });

    for (slot, (_, page)) in pages.iter_mut().zip(keyed) {
        *slot = page;
    }
}

/// Merges every page export of `query` into `{query_dir}/{stem}_combined.csv`
///
/// Returns `None` when no page export exists or none yielded a row.
pub fn combine_pages(layout: &Layout, query: &Query) -> Result<Option<CombinedDataset>> {
    relocate_strays(layout, query)?;

    let mut pages = layout.page_files(query)?;
    order_pages(&mut pages);

    let output = layout.combined_path(query);
    if pages.is_empty() {
        tracing::info!(query = %query, "No page exports to combine");
        return Ok(None);
    }

    let inputs: Vec<PathBuf> = pages.iter().map(|p| p.path.clone()).collect();
    let outcome = merge_files(&inputs, &output)?;

    let Some(path) = outcome.written else {
        return Ok(None);
    };

    let total = pages.len() as u32;
    let sources = pages
        .iter()
        .enumerate()
        .filter(|(_, p)| outcome.sources.contains(&p.path))
        .filter_map(|(index, p)| artifact_for(query, p, total - index as u32))
        .collect();

    Ok(Some(CombinedDataset {
        query: query.clone(),
        path,
        sources,
        rows: outcome.rows,
    }))
}

/// Timestamped pages have no page number of their own; their rank in capture
/// order (oldest is 1) stands in for it.
fn artifact_for(query: &Query, page: &PageFile, capture_rank: u32) -> Option<PageArtifact> {
    let artifact = match page.key {
        PageKey::Page(n) => PageArtifact::new(query.clone(), n, page.path.clone()),
        PageKey::Captured { at, .. } => {
            PageArtifact::new(query.clone(), capture_rank, page.path.clone())
                .map(|a| a.with_captured_at(at))
        }
    };
    artifact
        .map_err(|e| tracing::warn!(error = %e, "Page left out of the source list"))
        .ok()
}
