//! Per-query export session
//!
//! ```text
//! Setup -> AwaitingExport -> Renaming -> AwaitingNextPage -+-> AwaitingExport
//!                                                          +-> Terminated
//! ```
//!
//! A session never returns an error. Missing controls and expired waits
//! while paginating are how a finite result set ends; anything else is
//! logged and ends the session early.

pub mod machine;
pub mod wait;

pub use machine::{ExportSession, PaginationOutcome, SessionReport, SessionState, Termination};
pub use wait::{Readiness, Waiter};
