//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable console output
//! - Configurable log levels
//! - JSON file logging with rotation
//!
//! Every query session runs inside an `info_span!` carrying `state` and
//! `business_type`, so every line logged during a session is attributed to it.
//!
//! # Example
//!
//! ```no_run
//! use harvest::logging::init_logging;
//! use harvest::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Harvest started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a query session
///
/// # Example
///
/// ```no_run
/// use harvest::log_query_start;
/// use harvest::domain::{Query, StateName};
///
/// let query = Query::unfiltered(StateName::new("Goa").unwrap());
/// log_query_start!(&query, 3, 12);
/// ```
#[macro_export]
macro_rules! log_query_start {
    ($query:expr, $position:expr, $total:expr) => {
        tracing::info!(
            query = %$query,
            position = $position,
            total = $total,
            "Starting query"
        );
    };
}

/// Log the end of a query session
///
/// # Example
///
/// ```no_run
/// use harvest::log_query_complete;
/// use harvest::domain::{Query, StateName};
/// use std::time::Duration;
///
/// let query = Query::unfiltered(StateName::new("Goa").unwrap());
/// log_query_complete!(&query, 4, "no next page", Duration::from_secs(40));
/// ```
#[macro_export]
macro_rules! log_query_complete {
    ($query:expr, $pages:expr, $termination:expr, $duration:expr) => {
        tracing::info!(
            query = %$query,
            pages = $pages,
            termination = %$termination,
            duration_ms = $duration.as_millis() as u64,
            "Query finished"
        );
    };
}

/// Log a per-file failure that was isolated from the rest of a merge
///
/// # Example
///
/// ```no_run
/// use harvest::log_file_failure;
/// use harvest::domain::HarvestError;
/// use std::path::Path;
///
/// let error = HarvestError::Parse("bad header".to_string());
/// log_file_failure!(Path::new("Goa/Goa_combined.csv"), &error);
/// ```
#[macro_export]
macro_rules! log_file_failure {
    ($path:expr, $error:expr) => {
        tracing::warn!(
            path = %$path.display(),
            error = %$error,
            "Skipping file"
        );
    };
}

/// Log an error with context
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
