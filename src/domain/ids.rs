//! Domain identifier types with validation
//!
//! Newtype wrappers for the two query dimensions. Both hold the portal's
//! *visible label* verbatim (e.g. `"Andaman & Nicobar"`), because that is what
//! the dropdowns are matched against. Filesystem-safe forms are derived by the
//! layout module, never stored here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// State (region) label as shown in the portal's location dropdown
///
/// # Examples
///
/// ```
/// use harvest::domain::ids::StateName;
/// use std::str::FromStr;
///
/// let state = StateName::from_str("Tamil Nadu").unwrap();
/// assert_eq!(state.as_str(), "Tamil Nadu");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateName(String);

impl StateName {
    /// Creates a new StateName, rejecting blank labels
    pub fn new(label: impl Into<String>) -> Result<Self, String> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err("State name cannot be empty".to_string());
        }
        Ok(Self(label))
    }

    /// Returns the label as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StateName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for StateName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StateName> for String {
    fn from(value: StateName) -> Self {
        value.0
    }
}

impl AsRef<str> for StateName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Business-type label as shown in the portal's category dropdown
///
/// # Examples
///
/// ```
/// use harvest::domain::ids::BusinessType;
/// use std::str::FromStr;
///
/// let bt = BusinessType::from_str("Mining & Quarrying").unwrap();
/// assert_eq!(bt.to_string(), "Mining & Quarrying");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BusinessType(String);

impl BusinessType {
    /// Creates a new BusinessType, rejecting blank labels
    pub fn new(label: impl Into<String>) -> Result<Self, String> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err("Business type cannot be empty".to_string());
        }
        Ok(Self(label))
    }

    /// Returns the label as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BusinessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BusinessType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BusinessType> for String {
    fn from(value: BusinessType) -> Self {
        value.0
    }
}

impl AsRef<str> for BusinessType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_name_valid() {
        let state = StateName::new("NCT of Delhi").unwrap();
        assert_eq!(state.as_str(), "NCT of Delhi");
        assert_eq!(state.to_string(), "NCT of Delhi");
    }

    #[test]
    fn test_state_name_blank_rejected() {
        assert!(StateName::new("").is_err());
        assert!(StateName::new("   ").is_err());
    }

    #[test]
    fn test_business_type_blank_rejected() {
        assert!(BusinessType::from_str("\t").is_err());
    }

    #[test]
    fn test_labels_keep_punctuation() {
        let bt = BusinessType::new("Electricity, Gas & Water companies").unwrap();
        assert_eq!(bt.as_str(), "Electricity, Gas & Water companies");
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let state: StateName = serde_json::from_str("\"Goa\"").unwrap();
        assert_eq!(state.as_str(), "Goa");
        assert!(serde_json::from_str::<StateName>("\"\"").is_err());
    }
}
