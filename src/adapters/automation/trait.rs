//! Automation capability trait definition
//!
//! This module defines the `Automation` trait that abstracts the browser
//! driver. The export session only ever talks to the portal through this
//! trait, so it can be driven by a real WebDriver endpoint or by a scripted
//! fake in tests.

use crate::domain::Result;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// How a UI anchor is located
///
/// Written in configuration as `id:<id>`, `css:<selector>` or `xpath:<expr>`.
///
/// # Examples
///
/// ```
/// use harvest::adapters::automation::Selector;
/// use std::str::FromStr;
///
/// let selector = Selector::from_str("id:frm_submit").unwrap();
/// assert_eq!(selector, Selector::Id("frm_submit".to_string()));
/// assert_eq!(selector.to_string(), "id:frm_submit");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Element id attribute
    Id(String),
    /// CSS selector
    Css(String),
    /// XPath expression
    XPath(String),
}

impl FromStr for Selector {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| format!("selector '{s}' must start with id:, css: or xpath:"))?;

        let value = value.trim();
        if value.is_empty() {
            return Err(format!("selector '{s}' has an empty expression"));
        }

        match kind.trim().to_lowercase().as_str() {
            "id" => Ok(Selector::Id(value.to_string())),
            "css" => Ok(Selector::Css(value.to_string())),
            "xpath" => Ok(Selector::XPath(value.to_string())),
            other => Err(format!(
                "unknown selector kind '{other}' in '{s}' (expected id, css or xpath)"
            )),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(v) => write!(f, "id:{v}"),
            Selector::Css(v) => write!(f, "css:{v}"),
            Selector::XPath(v) => write!(f, "xpath:{v}"),
        }
    }
}

/// Opaque handle to a located UI control
///
/// A handle is tied to the document it was found in; once the page navigates
/// it goes stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    element_id: String,
    selector: Selector,
}

impl Control {
    /// Wraps a driver element reference
    pub fn new(element_id: impl Into<String>, selector: Selector) -> Self {
        Self {
            element_id: element_id.into(),
            selector,
        }
    }

    /// Driver-side element reference
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// Selector the control was found with
    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.selector, self.element_id)
    }
}

/// Browser automation capability
///
/// Every method is a single round trip to the driver. Waiting is layered on
/// top by the session's waiter, never implemented here.
#[async_trait]
pub trait Automation: Send + Sync {
    /// Loads a URL in the current window
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Locates the first control matching the selector
    ///
    /// Returns `Ok(None)` when nothing matches; errors are reserved for driver
    /// failures.
    async fn find_control(&self, selector: &Selector) -> Result<Option<Control>>;

    /// Whether the control is rendered
    async fn is_displayed(&self, control: &Control) -> Result<bool>;

    /// Whether the control accepts input
    async fn is_enabled(&self, control: &Control) -> Result<bool>;

    /// Native click
    ///
    /// # Errors
    ///
    /// `AutomationError::ClickIntercepted` when another element receives the click.
    async fn click(&self, control: &Control) -> Result<()>;

    /// Script-dispatched click that bypasses overlay interception
    async fn force_click(&self, control: &Control) -> Result<()>;

    /// Scrolls the control to the top of the viewport
    async fn scroll_into_view(&self, control: &Control) -> Result<()>;

    /// Picks the dropdown option whose visible text equals `visible_label`
    ///
    /// # Errors
    ///
    /// `AutomationError::OptionNotFound` when the dropdown has no such option.
    async fn select_option(&self, control: &Control, visible_label: &str) -> Result<()>;

    /// Whether the control has left the document
    async fn is_stale(&self, control: &Control) -> Result<bool>;

    /// Closes the browser session
    async fn shutdown(&self) -> Result<()>;
}
