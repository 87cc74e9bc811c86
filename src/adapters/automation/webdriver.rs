//! W3C WebDriver implementation of the automation capability
//!
//! Talks to a running driver server over its JSON wire protocol. A single
//! session is created on connect and torn down by [`Automation::shutdown`].

use super::{Automation, Control, Selector};
use crate::config::{Browser, WebDriverConfig};
use crate::domain::{AutomationError, HarvestError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Key under which W3C drivers return element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// WebDriver-backed automation
///
/// # Example
///
/// ```no_run
/// use harvest::adapters::automation::{Automation, Selector, WebDriverAutomation};
/// use harvest::config::WebDriverConfig;
/// use std::path::Path;
///
/// # async fn example() -> harvest::domain::Result<()> {
/// let driver = WebDriverAutomation::connect(&WebDriverConfig::default(), Path::new("downloads")).await?;
/// driver.navigate("https://example.com").await?;
/// let submit = driver.find_control(&Selector::Id("frm_submit".into())).await?;
/// driver.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct WebDriverAutomation {
    /// Driver server URL without trailing slash
    base_url: String,

    client: Client,

    session_id: String,
}

impl WebDriverAutomation {
    /// Starts a browser session whose downloads land in `download_dir`
    ///
    /// # Errors
    ///
    /// `AutomationError::ConnectionFailed` when the driver is unreachable,
    /// `AutomationError::SessionFailed` when it refuses the session.
    pub async fn connect(config: &WebDriverConfig, download_dir: &Path) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AutomationError::ConnectionFailed(e.to_string()))?;

        let base_url = config.url.trim_end_matches('/').to_string();
        let download_dir = absolute_dir(download_dir)?;
        let body = Self::capabilities(config, &download_dir);

        tracing::info!(
            url = %base_url,
            browser = ?config.browser,
            download_dir = %download_dir.display(),
            "Creating WebDriver session"
        );

        let value = send(&client, Method::POST, &format!("{base_url}/session"), Some(body))
            .await
            .map_err(|e| match e {
                HarvestError::Automation(AutomationError::InvalidResponse(msg)) => {
                    AutomationError::SessionFailed(msg).into()
                }
                other => other,
            })?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AutomationError::SessionFailed("new session response has no sessionId".to_string())
            })?
            .to_string();

        tracing::debug!(session_id = %session_id, "WebDriver session created");

        Ok(Self {
            base_url,
            client,
            session_id,
        })
    }

    /// New-session payload for the configured browser
    pub fn capabilities(config: &WebDriverConfig, download_dir: &Path) -> Value {
        let prefs = json!({
            "download.default_directory": download_dir.display().to_string(),
            "download.prompt_for_download": false,
            "download.directory_upgrade": true,
            "safebrowsing.enabled": true
        });

        let mut args = Vec::new();
        if config.start_maximized {
            args.push("--start-maximized");
        }

        let (browser_name, options_key) = match config.browser {
            Browser::Edge => ("MicrosoftEdge", "ms:edgeOptions"),
            Browser::Chrome => ("chrome", "goog:chromeOptions"),
        };

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": browser_name,
                    options_key: {
                        "args": args,
                        "prefs": prefs
                    }
                }
            }
        })
    }

    /// Session id assigned by the driver
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        send(&self.client, method, &url, body).await
    }

    async fn execute(&self, script: &str, control: &Control) -> Result<()> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": [element_ref(control)] })),
        )
        .await
        .map(|_| ())
    }

    async fn find_from(&self, path: &str, selector: &Selector) -> Result<Option<Control>> {
        let (using, value) = locator(selector);
        let result = self
            .command(
                Method::POST,
                path,
                Some(json!({ "using": using, "value": value })),
            )
            .await;

        match result {
            Ok(value) => {
                let element_id = value
                    .get(ELEMENT_KEY)
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        AutomationError::InvalidResponse(format!(
                            "element response for {selector} has no element reference"
                        ))
                    })?;
                Ok(Some(Control::new(element_id, selector.clone())))
            }
            Err(HarvestError::Automation(AutomationError::ControlNotFound(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn element_flag(&self, control: &Control, property: &str) -> Result<bool> {
        let value = self
            .command(
                Method::GET,
                &format!("/element/{}/{property}", control.element_id()),
                None,
            )
            .await?;
        value.as_bool().ok_or_else(|| {
            AutomationError::InvalidResponse(format!("{property} of {control} is not a boolean"))
                .into()
        })
    }
}

#[async_trait]
impl Automation for WebDriverAutomation {
    async fn navigate(&self, url: &str) -> Result<()> {
        tracing::debug!(url = %url, "Navigating");
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn find_control(&self, selector: &Selector) -> Result<Option<Control>> {
        self.find_from("/element", selector).await
    }

    async fn is_displayed(&self, control: &Control) -> Result<bool> {
        self.element_flag(control, "displayed").await
    }

    async fn is_enabled(&self, control: &Control) -> Result<bool> {
        self.element_flag(control, "enabled").await
    }

    async fn click(&self, control: &Control) -> Result<()> {
        self.command(
            Method::POST,
            &format!("/element/{}/click", control.element_id()),
            Some(json!({})),
        )
        .await
        .map(|_| ())
    }

    async fn force_click(&self, control: &Control) -> Result<()> {
        self.execute("arguments[0].click();", control).await
    }

    async fn scroll_into_view(&self, control: &Control) -> Result<()> {
        self.execute("arguments[0].scrollIntoView(true);", control)
            .await
    }

    async fn select_option(&self, control: &Control, visible_label: &str) -> Result<()> {
        let option = Selector::XPath(format!(
            ".//option[normalize-space(.)={}]",
            xpath_literal(visible_label.trim())
        ));
        let path = format!("/element/{}/element", control.element_id());

        let option = self.find_from(&path, &option).await?.ok_or_else(|| {
            AutomationError::OptionNotFound {
                control: control.selector().to_string(),
                label: visible_label.to_string(),
            }
        })?;

        self.click(&option).await
    }

    async fn is_stale(&self, control: &Control) -> Result<bool> {
        match self.is_enabled(control).await {
            Ok(_) => Ok(false),
            Err(HarvestError::Automation(AutomationError::StaleControl(_)))
            | Err(HarvestError::Automation(AutomationError::ControlNotFound(_))) => Ok(true),
            Err(e) => Err(e),
        }
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!(session_id = %self.session_id, "Closing WebDriver session");
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        send(&self.client, Method::DELETE, &url, None)
            .await
            .map(|_| ())
    }
}

/// Sends one wire command and unwraps its `value`
async fn send(client: &Client, method: Method, url: &str, body: Option<Value>) -> Result<Value> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request
        .send()
        .await
        .map_err(|e| AutomationError::ConnectionFailed(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AutomationError::InvalidResponse(e.to_string()))?;

    let payload: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).map_err(|e| {
            AutomationError::InvalidResponse(format!("status {status}, unparseable body: {e}"))
        })?
    };

    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Err(map_wire_error(error, message).into());
    }

    Ok(value)
}

/// Maps a W3C error code onto the automation error taxonomy
pub fn map_wire_error(error: &str, message: &str) -> AutomationError {
    match error {
        "no such element" => AutomationError::ControlNotFound(message.to_string()),
        "stale element reference" => AutomationError::StaleControl(message.to_string()),
        "element click intercepted" | "element not interactable" => {
            AutomationError::ClickIntercepted(message.to_string())
        }
        "invalid session id" | "session not created" => {
            AutomationError::SessionFailed(format!("{error}: {message}"))
        }
        "timeout" | "script timeout" => AutomationError::Timeout {
            what: message.to_string(),
            waited: Duration::ZERO,
        },
        other => AutomationError::InvalidResponse(format!("{other}: {message}")),
    }
}

/// W3C locator strategy for a selector
fn locator(selector: &Selector) -> (&'static str, String) {
    match selector {
        Selector::Id(id) => (
            "css selector",
            format!("[id=\"{}\"]", id.replace('\\', "\\\\").replace('"', "\\\"")),
        ),
        Selector::Css(css) => ("css selector", css.clone()),
        Selector::XPath(xpath) => ("xpath", xpath.clone()),
    }
}

fn element_ref(control: &Control) -> Value {
    json!({ ELEMENT_KEY: control.element_id() })
}

/// Quotes text as an XPath string literal
///
/// XPath 1.0 has no escape sequences, so text holding both quote kinds is
/// spliced together with `concat()`.
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{text}'")
    } else if !text.contains('"') {
        format!("\"{text}\"")
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

fn absolute_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| HarvestError::io_at(dir, e))?;
    Ok(cwd.join(dir))
}
