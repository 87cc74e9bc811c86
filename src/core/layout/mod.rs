//! File naming and on-disk layout
//!
//! Everything lives under one download root:
//!
//! ```text
//! {root}/
//!   data.csv                         raw export, present only mid-page
//!   {state}_{bt}/                    one directory per filtered query
//!     {state}_{bt}_page_{n}.csv
//!     {state}_{bt}_combined.csv
//!   {state}/                         one directory per unfiltered query
//!     {state}_{YYYYmmddHHMMSS}.csv
//!     {state}_combined.csv
//!   {state}_consolidated.csv         per filtered state
//! ```

pub mod naming;

pub use naming::{
    combined_file_name, consolidated_file_name, page_file_name, query_stem, sanitize,
    timestamp_file_name, PageKey, PageNamePattern, COMBINED_SUFFIX, CONSOLIDATED_SUFFIX,
    TIMESTAMP_FORMAT,
};

use crate::domain::{HarvestError, Query, Result, StateName};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

/// A page export found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFile {
    pub key: PageKey,
    pub path: PathBuf,
}

/// Path derivation rooted at the download directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the browser drops a fresh export
    pub fn raw_download_path(&self, raw_filename: &str) -> PathBuf {
        self.root.join(raw_filename)
    }

    /// Directory holding a query's pages and combined dataset
    pub fn query_dir(&self, query: &Query) -> PathBuf {
        self.root.join(query_stem(query))
    }

    pub fn combined_path(&self, query: &Query) -> PathBuf {
        self.query_dir(query).join(combined_file_name(query))
    }

    pub fn consolidated_path(&self, state: &StateName) -> PathBuf {
        self.root.join(consolidated_file_name(state.as_str()))
    }

    pub fn global_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Creates a directory and its parents; succeeds if it already exists
    pub fn ensure_dir(path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| HarvestError::io_at(path, e))
    }

    /// Creates the query directory and returns it
    pub fn ensure_query_dir(&self, query: &Query) -> Result<PathBuf> {
        let dir = self.query_dir(query);
        Self::ensure_dir(&dir)?;
        Ok(dir)
    }

    /// Canonical destination for a freshly captured page
    ///
    /// Page-numbered names are fixed, so a re-export replaces the earlier file.
    /// Timestamped names get a `_{n}` suffix until they no longer collide.
    pub fn page_target(
        &self,
        query: &Query,
        page_number: u32,
        captured_at: NaiveDateTime,
    ) -> PathBuf {
        let dir = self.query_dir(query);
        if query.is_filtered() {
            return dir.join(page_file_name(query, page_number));
        }

        let mut seq = 0;
        loop {
            let candidate = dir.join(timestamp_file_name(query, captured_at, seq));
            if !candidate.exists() {
                return candidate;
            }
            seq += 1;
        }
    }

    /// Page exports of a query inside its directory, in no particular order
    ///
    /// A missing directory yields an empty list.
    pub fn page_files(&self, query: &Query) -> Result<Vec<PageFile>> {
        Self::scan_pages(&self.query_dir(query), query)
    }

    /// Page exports of a query left directly in the root
    pub fn stray_page_files(&self, query: &Query) -> Result<Vec<PageFile>> {
        Self::scan_pages(&self.root, query)
    }

    /// Query directories of a filtered state: every directory under the root
    /// named `{state}_*`, sorted by name
    pub fn state_query_dirs(&self, state: &StateName) -> Result<Vec<PathBuf>> {
        let pattern = format!(
            "{}/{}_*",
            glob::Pattern::escape(&self.root.to_string_lossy()),
            glob::Pattern::escape(&sanitize(state.as_str()))
        );
        let mut dirs: Vec<PathBuf> = glob_paths(&pattern)?
            .into_iter()
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();
        Ok(dirs)
    }

    /// Combined datasets inside one directory, sorted by name
    pub fn combined_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
        let pattern = format!(
            "{}/*{COMBINED_SUFFIX}",
            glob::Pattern::escape(&dir.to_string_lossy())
        );
        let mut files: Vec<PathBuf> = glob_paths(&pattern)?
            .into_iter()
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    fn scan_pages(dir: &Path, query: &Query) -> Result<Vec<PageFile>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let pattern = PageNamePattern::for_query(query)?;
        let entries = fs::read_dir(dir).map_err(|e| HarvestError::io_at(dir, e))?;

        let mut pages = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| HarvestError::io_at(dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(key) = pattern.parse(name) {
                pages.push(PageFile { key, path });
            }
        }
        Ok(pages)
    }
}

fn glob_paths(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern)
        .map_err(|e| HarvestError::Other(format!("Invalid glob pattern '{pattern}': {e}")))?;

    let mut found = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => found.push(path),
            Err(e) => {
                tracing::warn!(path = %e.path().display(), error = %e, "Skipping unreadable path");
            }
        }
    }
    Ok(found)
}
