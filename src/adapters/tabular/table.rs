//! In-memory table with column-union concatenation

use crate::domain::{HarvestError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Header plus string rows, every row as wide as the header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table with the given header
    pub fn with_headers(headers: Vec<String>) -> Self {
        Self {
            headers: dedupe_headers(headers),
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Adds a row, padding short rows with empty cells
    ///
    /// Rows wider than the header are rejected and `false` is returned.
    pub fn push_row(&mut self, mut row: Vec<String>) -> bool {
        if row.len() > self.headers.len() {
            return false;
        }
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
        true
    }

    /// Appends another table below this one
    ///
    /// Columns are matched by name. Columns only `other` has are added on the
    /// right and left empty for existing rows; columns only `self` has are
    /// left empty for the appended rows.
    pub fn append(&mut self, other: Table) {
        if self.headers.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }

        for header in &other.headers {
            if !self.headers.contains(header) {
                self.headers.push(header.clone());
            }
        }
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }

        let position: HashMap<&str, usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect();
        let mapping: Vec<usize> = other
            .headers
            .iter()
            .map(|h| position[h.as_str()])
            .collect();

        for row in other.rows {
            let mut aligned = vec![String::new(); width];
            for (cell, &target) in row.into_iter().zip(&mapping) {
                aligned[target] = cell;
            }
            self.rows.push(aligned);
        }
    }
}

/// Outcome of a lenient read
#[derive(Debug, Clone)]
pub struct ReadReport {
    pub table: Table,
    /// Rows dropped because they could not be decoded or were too wide
    pub skipped_rows: usize,
}

/// Reads a CSV file, skipping rows that cannot be used
///
/// # Errors
///
/// Fails for the whole file when it cannot be opened, is empty, or its header
/// cannot be decoded. Individual bad rows never fail the read.
pub fn read_table(path: &Path) -> Result<ReadReport> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| HarvestError::io_at(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| HarvestError::parse_at(path, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(HarvestError::parse_at(path, "no header row"));
    }

    let mut table = Table::with_headers(headers);
    let mut skipped_rows = 0;

    for record in reader.records() {
        match record {
            Ok(record) => {
                if record.iter().all(|cell| cell.is_empty()) {
                    continue;
                }
                if !table.push_row(record.iter().map(str::to_string).collect()) {
                    skipped_rows += 1;
                }
            }
            Err(e) if e.is_io_error() => return Err(HarvestError::io_at(path, e)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Skipping undecodable row");
                skipped_rows += 1;
            }
        }
    }

    if skipped_rows > 0 {
        tracing::warn!(
            path = %path.display(),
            skipped_rows = skipped_rows,
            "Skipped malformed rows"
        );
    }

    Ok(ReadReport {
        table,
        skipped_rows,
    })
}

/// Writes a table with its header as UTF-8 CSV
///
/// The file is written beside the target and renamed into place, so readers
/// never observe a half-written dataset.
///
/// # Errors
///
/// Returns an I/O error when the temporary file cannot be written or renamed.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| HarvestError::io_at(path, "not a file path"))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    {
        let mut writer = csv::Writer::from_path(&tmp).map_err(|e| HarvestError::io_at(&tmp, e))?;
        writer
            .write_record(table.headers())
            .map_err(|e| HarvestError::io_at(&tmp, e))?;
        for row in table.rows() {
            writer
                .write_record(row)
                .map_err(|e| HarvestError::io_at(&tmp, e))?;
        }
        writer.flush().map_err(|e| HarvestError::io_at(&tmp, e))?;
    }

    fs::rename(&tmp, path).map_err(|e| HarvestError::io_at(path, e))?;
    Ok(())
}

/// Repeated column names get `.1`, `.2`, ... suffixes
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());
    for header in headers {
        let mut name = header.clone();
        while let Some(count) = seen.get_mut(&name) {
            *count += 1;
            name = format!("{header}.{count}");
        }
        seen.insert(name.clone(), 0);
        out.push(name);
    }
    out
}
