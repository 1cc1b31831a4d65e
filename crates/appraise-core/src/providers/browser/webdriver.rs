//! W3C WebDriver client (chromedriver, geckodriver).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use super::{BrowserDriver, PageHandle, SessionHandle};
use crate::config::BrowserSettings;
use crate::errors::{BrowserError, BrowserResult};

/// Runs the check body through indirect eval so bare expressions, promises
/// and function expressions all resolve to a value.
const ASYNC_EVAL_WRAPPER: &str = r#"
const done = arguments[arguments.length - 1];
const source = arguments[0];
Promise.resolve()
  .then(() => {
    const value = (0, eval)(source);
    return typeof value === "function" ? value() : value;
  })
  .then(
    (value) => done({ value: value === undefined ? null : value }),
    (err) => done({ __error: String((err && err.message) || err) })
  );
"#;

#[derive(Debug, Clone)]
pub struct WebDriverClient {
    client: reqwest::Client,
    base_url: String,
    headless: bool,
    script_timeout: Duration,
}

/// Error body of a failed WebDriver command.
#[derive(Debug)]
struct WireError {
    code: String,
    message: String,
}

impl WireError {
    fn is_timeout(&self) -> bool {
        self.code == "timeout" || self.code == "script timeout"
    }

    fn into_protocol(self) -> BrowserError {
        BrowserError::Protocol(format!("{}: {}", self.code, self.message))
    }
}

impl WebDriverClient {
    pub fn new(settings: &BrowserSettings, script_timeout: Duration) -> BrowserResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| BrowserError::Session(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.webdriver_url.trim_end_matches('/').to_string(),
            headless: settings.headless,
            script_timeout,
        })
    }

    fn capabilities(&self) -> Value {
        let mut chrome_args = vec!["--no-sandbox", "--disable-dev-shm-usage"];
        let mut firefox_args = Vec::new();
        if self.headless {
            chrome_args.push("--headless=new");
            firefox_args.push("-headless");
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "timeouts": { "script": self.script_timeout.as_millis() as u64 },
                    "goog:chromeOptions": { "args": chrome_args },
                    "moz:firefoxOptions": { "args": firefox_args }
                }
            }
        })
    }

    /// Send one command; `Ok(Err(..))` is a WebDriver-level failure.
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> BrowserResult<Result<Value, WireError>> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| BrowserError::Protocol(format!("{} {}: {}", status.as_u16(), path, e)))?;
        let value = payload.get("value").cloned().unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(Ok(value));
        }

        let field = |name: &str| {
            value
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Ok(Err(WireError {
            code: field("error"),
            message: field("message"),
        }))
    }

    async fn switch_to(&self, page: &PageHandle) -> BrowserResult<()> {
        self.command(
            Method::POST,
            &format!("/session/{}/window", page.session_id),
            Some(json!({ "handle": page.handle })),
        )
        .await?
        .map(|_| ())
        .map_err(WireError::into_protocol)
    }
}

#[async_trait]
impl BrowserDriver for WebDriverClient {
    async fn open_session(&self) -> BrowserResult<SessionHandle> {
        let value = self
            .command(Method::POST, "/session", Some(self.capabilities()))
            .await
            .map_err(|e| BrowserError::Session(e.to_string()))?
            .map_err(|e| BrowserError::Session(format!("{}: {}", e.code, e.message)))?;

        let id = value
            .get("sessionId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrowserError::Session("response missing sessionId".to_string()))?;

        debug!(session = id, headless = self.headless, "webdriver session opened");
        Ok(SessionHandle { id: id.to_string() })
    }

    async fn close_session(&self, session: SessionHandle) -> BrowserResult<()> {
        self.command(Method::DELETE, &format!("/session/{}", session.id), None)
            .await?
            .map(|_| ())
            .map_err(WireError::into_protocol)
    }

    async fn new_page(&self, session: &SessionHandle) -> BrowserResult<PageHandle> {
        let value = self
            .command(
                Method::POST,
                &format!("/session/{}/window/new", session.id),
                Some(json!({ "type": "tab" })),
            )
            .await?
            .map_err(WireError::into_protocol)?;

        let handle = value
            .get("handle")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrowserError::Protocol("new window response missing handle".into()))?;

        Ok(PageHandle {
            session_id: session.id.clone(),
            handle: handle.to_string(),
        })
    }

    async fn navigate(&self, page: &PageHandle, url: &str, timeout: Duration) -> BrowserResult<()> {
        self.switch_to(page).await?;
        self.command(
            Method::POST,
            &format!("/session/{}/timeouts", page.session_id),
            Some(json!({ "pageLoad": timeout.as_millis() as u64 })),
        )
        .await?
        .map_err(WireError::into_protocol)?;

        let outcome = self
            .command(
                Method::POST,
                &format!("/session/{}/url", page.session_id),
                Some(json!({ "url": url })),
            )
            .await?;

        match outcome {
            Ok(_) => Ok(()),
            Err(e) if e.is_timeout() => Err(BrowserError::Timeout {
                operation: format!("navigate {}", url),
                after: timeout,
            }),
            Err(e) => Err(BrowserError::Navigation {
                url: url.to_string(),
                message: format!("{}: {}", e.code, e.message),
            }),
        }
    }

    async fn evaluate_script(&self, page: &PageHandle, code: &str) -> BrowserResult<Value> {
        self.switch_to(page).await?;
        let outcome = self
            .command(
                Method::POST,
                &format!("/session/{}/execute/async", page.session_id),
                Some(json!({ "script": ASYNC_EVAL_WRAPPER, "args": [code] })),
            )
            .await?;

        let value = match outcome {
            Ok(value) => value,
            Err(e) if e.is_timeout() => {
                return Err(BrowserError::Timeout {
                    operation: "script".to_string(),
                    after: self.script_timeout,
                })
            }
            Err(e) => return Err(BrowserError::Script(e.message)),
        };

        if let Some(err) = value.get("__error") {
            let message = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
            return Err(BrowserError::Script(message));
        }
        Ok(value.get("value").cloned().unwrap_or(Value::Null))
    }

    async fn close_page(&self, page: PageHandle) -> BrowserResult<()> {
        self.switch_to(&page).await?;
        self.command(
            Method::DELETE,
            &format!("/session/{}/window", page.session_id),
            None,
        )
        .await?
        .map(|_| ())
        .map_err(WireError::into_protocol)
    }
}
