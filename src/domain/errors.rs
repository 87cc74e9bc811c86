//! Domain error types
//!
//! This module defines the error hierarchy for Harvest. The browser driver and
//! CSV parser never leak their own error types past the adapters; everything is
//! converted into [`HarvestError`] or [`AutomationError`].

use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Main Harvest error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Browser automation errors
    #[error("Automation error: {0}")]
    Automation(#[from] AutomationError),

    /// I/O errors (missing, unreadable or unwritable files)
    #[error("I/O error: {0}")]
    Io(String),

    /// Tabular parse errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operator checkpoint errors
    #[error("Operator signal error: {0}")]
    Signal(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl HarvestError {
    /// Builds an I/O error that names the offending path
    pub fn io_at(path: &Path, err: impl std::fmt::Display) -> Self {
        HarvestError::Io(format!("{}: {err}", path.display()))
    }

    /// Builds a parse error that names the offending path
    pub fn parse_at(path: &Path, err: impl std::fmt::Display) -> Self {
        HarvestError::Parse(format!("{}: {err}", path.display()))
    }

    /// Returns true when the error is the portal's way of saying "no more pages"
    pub fn is_pagination_end(&self) -> bool {
        matches!(self, HarvestError::Automation(e) if e.is_pagination_end())
    }
}

/// Errors raised while driving the portal UI
///
/// Mirrors the taxonomy of the automation capability: a required anchor is
/// absent, a readiness wait ran out, or the driver itself misbehaved.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// A required UI anchor could not be located
    #[error("Control not found: {0}")]
    ControlNotFound(String),

    /// A dropdown did not offer the requested visible label
    #[error("Option '{label}' not found in {control}")]
    OptionNotFound { control: String, label: String },

    /// A readiness wait exceeded its bound
    #[error("Timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },

    /// A normal click landed on another element (usually an overlay)
    #[error("Click intercepted: {0}")]
    ClickIntercepted(String),

    /// The control no longer belongs to the current document
    #[error("Stale control: {0}")]
    StaleControl(String),

    /// The driver session could not be created or was lost
    #[error("Session failed: {0}")]
    SessionFailed(String),

    /// The driver endpoint could not be reached
    #[error("Failed to connect to automation endpoint: {0}")]
    ConnectionFailed(String),

    /// The driver answered with something we could not understand
    #[error("Invalid response from automation endpoint: {0}")]
    InvalidResponse(String),
}

impl AutomationError {
    /// Builds a timeout error for the named wait
    pub fn timeout(what: impl Into<String>, waited: Duration) -> Self {
        AutomationError::Timeout {
            what: what.into(),
            waited,
        }
    }

    /// Control-not-found and timeouts are how pagination normally ends
    pub fn is_pagination_end(&self) -> bool {
        matches!(
            self,
            AutomationError::ControlNotFound(_)
                | AutomationError::Timeout { .. }
                | AutomationError::StaleControl(_)
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for HarvestError {
    fn from(err: std::io::Error) -> Self {
        HarvestError::Io(err.to_string())
    }
}

// Conversion from csv::Error
impl From<csv::Error> for HarvestError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            HarvestError::Io(err.to_string())
        } else {
            HarvestError::Parse(err.to_string())
        }
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for HarvestError {
    fn from(err: serde_json::Error) -> Self {
        HarvestError::Parse(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for HarvestError {
    fn from(err: toml::de::Error) -> Self {
        HarvestError::Configuration(format!("TOML parse error: {err}"))
    }
}
