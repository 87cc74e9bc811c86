//! Browser automation adapter
//!
//! The `Automation` trait is the only way the export session touches the
//! portal. [`WebDriverAutomation`] implements it against any W3C WebDriver
//! endpoint (msedgedriver, chromedriver).

mod r#trait;
pub mod webdriver;

pub use r#trait::{Automation, Control, Selector};
pub use webdriver::WebDriverAutomation;
