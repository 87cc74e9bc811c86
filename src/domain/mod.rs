//! Domain models and types for Harvest.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed labels** ([`StateName`], [`BusinessType`])
//! - **The query model** ([`Query`])
//! - **File artifacts** ([`PageArtifact`], [`CombinedDataset`], [`ConsolidatedDataset`], [`GlobalDataset`])
//! - **Error types** ([`HarvestError`], [`AutomationError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! State and business-type labels are distinct newtypes, so a query can never
//! be built with its dimensions swapped:
//!
//! ```rust
//! use harvest::domain::{BusinessType, Query, StateName};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let query = Query::filtered(StateName::new("Gujarat")?, BusinessType::new("Trading")?);
//! assert_eq!(query.to_string(), "Gujarat - Trading");
//! # Ok(())
//! # }
//! ```

pub mod dataset;
pub mod errors;
pub mod ids;
pub mod query;
pub mod result;

// Re-export commonly used types for convenience
pub use dataset::{CombinedDataset, ConsolidatedDataset, GlobalDataset, PageArtifact};
pub use errors::{AutomationError, HarvestError};
pub use ids::{BusinessType, StateName};
pub use query::Query;
pub use result::Result;
