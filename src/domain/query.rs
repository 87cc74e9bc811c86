//! Query model
//!
//! A [`Query`] is one (state, optional business-type) combination. It drives
//! exactly one pagination session and is never mutated once built.

use super::ids::{BusinessType, StateName};
use std::fmt;

/// One combination of query dimensions
///
/// Identity is the pair `(state, business_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    state: StateName,
    business_type: Option<BusinessType>,
}

impl Query {
    /// Query filtered by a business type
    pub fn filtered(state: StateName, business_type: BusinessType) -> Self {
        Self {
            state,
            business_type: Some(business_type),
        }
    }

    /// Query over a whole state, with no business-type dimension
    pub fn unfiltered(state: StateName) -> Self {
        Self {
            state,
            business_type: None,
        }
    }

    /// State this query covers
    pub fn state(&self) -> &StateName {
        &self.state
    }

    /// Business type, if the query is filtered
    pub fn business_type(&self) -> Option<&BusinessType> {
        self.business_type.as_ref()
    }

    /// True when the query carries a business-type filter
    pub fn is_filtered(&self) -> bool {
        self.business_type.is_some()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.business_type {
            Some(bt) => write!(f, "{} - {}", self.state, bt),
            None => write!(f, "{}", self.state),
        }
    }
}
