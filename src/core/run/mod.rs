//! Run orchestration and reporting

pub mod coordinator;
pub mod summary;

pub use coordinator::{rebuild_datasets, RunCoordinator};
pub use summary::{
    file_checksum, DatasetTier, QueryOutcome, QueryRecord, RunError, RunErrorType, RunSummary,
    WrittenDataset,
};
