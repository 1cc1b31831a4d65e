//! Headless browser driver.
//!
//! A [`SessionHandle`] is owned by whoever opened it (the batch runner) and
//! lent to everything that opens pages inside it.

pub mod webdriver;

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::BrowserResult;

pub use webdriver::WebDriverClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub id: String,
}

/// A tab inside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHandle {
    pub session_id: String,
    pub handle: String,
}

#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn open_session(&self) -> BrowserResult<SessionHandle>;

    async fn close_session(&self, session: SessionHandle) -> BrowserResult<()>;

    async fn new_page(&self, session: &SessionHandle) -> BrowserResult<PageHandle>;

    /// Load `url`, giving up after `timeout`.
    async fn navigate(&self, page: &PageHandle, url: &str, timeout: Duration) -> BrowserResult<()>;

    /// Evaluate `code` in the page and return its JSON-serialised value.
    /// Promises are awaited; a function expression is called.
    async fn evaluate_script(&self, page: &PageHandle, code: &str)
        -> BrowserResult<serde_json::Value>;

    async fn close_page(&self, page: PageHandle) -> BrowserResult<()>;
}
