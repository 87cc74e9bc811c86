//! Canonical names for page exports and datasets

use crate::domain::{HarvestError, Query, Result};
use chrono::NaiveDateTime;
use regex::Regex;

/// Suffix of a query's combined dataset
pub const COMBINED_SUFFIX: &str = "_combined.csv";

/// Suffix of a state's consolidated dataset
pub const CONSOLIDATED_SUFFIX: &str = "_consolidated.csv";

/// Capture timestamp as written in unfiltered page names (second resolution)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Makes a label safe for file and directory names
///
/// Spaces become underscores, `&` becomes `and`, and anything else that is not
/// alphanumeric or an underscore is dropped.
///
/// # Examples
///
/// ```
/// use harvest::core::layout::sanitize;
///
/// assert_eq!(sanitize("Andaman & Nicobar"), "Andaman_and_Nicobar");
/// assert_eq!(sanitize("Manufacturing (Food stuffs)"), "Manufacturing_Food_stuffs");
/// ```
pub fn sanitize(label: &str) -> String {
    label
        .replace(' ', "_")
        .replace('&', "and")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// `{state}` or `{state}_{business_type}`, sanitized
///
/// Names both the query directory and the prefix of every file in it.
pub fn query_stem(query: &Query) -> String {
    match query.business_type() {
        Some(bt) => format!("{}_{}", sanitize(query.state().as_str()), sanitize(bt.as_str())),
        None => sanitize(query.state().as_str()),
    }
}

/// Name of a page-numbered export: `{state}_{business_type}_page_{n}.csv`
pub fn page_file_name(query: &Query, page_number: u32) -> String {
    format!("{}_page_{page_number}.csv", query_stem(query))
}

/// Name of a timestamped export: `{state}_{timestamp}.csv`, or
/// `{state}_{timestamp}_{seq}.csv` when `seq > 0`
pub fn timestamp_file_name(query: &Query, captured_at: NaiveDateTime, seq: u32) -> String {
    let stamp = captured_at.format(TIMESTAMP_FORMAT);
    if seq == 0 {
        format!("{}_{stamp}.csv", query_stem(query))
    } else {
        format!("{}_{stamp}_{seq}.csv", query_stem(query))
    }
}

/// Name of a query's combined dataset
pub fn combined_file_name(query: &Query) -> String {
    format!("{}{COMBINED_SUFFIX}", query_stem(query))
}

/// Name of a state's consolidated dataset
pub fn consolidated_file_name(state: &str) -> String {
    format!("{}{CONSOLIDATED_SUFFIX}", sanitize(state))
}

/// Ordering key recovered from a page file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKey {
    /// Explicit page number (business-type filtered queries)
    Page(u32),
    /// Capture instant plus collision sequence (unfiltered queries)
    Captured { at: NaiveDateTime, seq: u32 },
}

/// Recognises the canonical page names of one query
#[derive(Debug, Clone)]
pub struct PageNamePattern {
    regex: Regex,
    filtered: bool,
}

impl PageNamePattern {
    pub fn for_query(query: &Query) -> Result<Self> {
        let stem = regex::escape(&query_stem(query));
        let (pattern, filtered) = if query.is_filtered() {
            (format!(r"^{stem}_page_(\d+)\.csv$"), true)
        } else {
            (format!(r"^{stem}_(\d{{14}})(?:_(\d+))?\.csv$"), false)
        };
        let regex = Regex::new(&pattern)
            .map_err(|e| HarvestError::Other(format!("Invalid page name pattern: {e}")))?;
        Ok(Self { regex, filtered })
    }

    /// Parses a file name, returning `None` for anything that is not a page
    /// export of this query (combined outputs included)
    pub fn parse(&self, file_name: &str) -> Option<PageKey> {
        let caps = self.regex.captures(file_name)?;
        if self.filtered {
            let page: u32 = caps[1].parse().ok()?;
            (page >= 1).then_some(PageKey::Page(page))
        } else {
            let at = NaiveDateTime::parse_from_str(&caps[1], TIMESTAMP_FORMAT).ok()?;
            let seq = match caps.get(2) {
                Some(m) => m.as_str().parse().ok()?,
                None => 0,
            };
            Some(PageKey::Captured { at, seq })
        }
    }
}
