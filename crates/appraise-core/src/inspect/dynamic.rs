use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::checks::{descriptive_outcome, task_check_name, DYNAMIC_LOAD_CHECK};
use crate::config::EvaluationSettings;
use crate::errors::BrowserError;
use crate::model::{CheckOutcome, CheckResult, CheckSpec, Submission, TaskRecord};
use crate::providers::browser::{BrowserDriver, PageHandle, SessionHandle};

/// Lifecycle of the page opened for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    NotStarted,
    PageLoaded,
    ChecksRun,
    Closed,
    LoadFailed,
}

impl PageState {
    pub fn can_advance_to(self, next: PageState) -> bool {
        use PageState::*;
        matches!(
            (self, next),
            (NotStarted, PageLoaded)
                | (NotStarted, LoadFailed)
                | (PageLoaded, ChecksRun)
                | (ChecksRun, Closed)
        )
    }

    fn advance(&mut self, next: PageState) {
        debug_assert!(self.can_advance_to(next), "{:?} -> {:?}", self, next);
        *self = next;
    }
}

#[derive(Debug, Clone)]
pub struct DynamicRun {
    /// `Closed` or `LoadFailed`.
    pub state: PageState,
    pub results: Vec<CheckResult>,
}

impl DynamicRun {
    pub fn page_loaded(&self) -> bool {
        self.state != PageState::LoadFailed
    }
}

/// Runs task checks against the live page in a borrowed browser session.
pub struct DynamicInspector {
    driver: Arc<dyn BrowserDriver>,
    page_load_timeout: Duration,
    script_timeout: Duration,
}

impl DynamicInspector {
    pub fn new(driver: Arc<dyn BrowserDriver>, settings: &EvaluationSettings) -> Self {
        Self {
            driver,
            page_load_timeout: settings.page_load_timeout(),
            script_timeout: settings.script_timeout(),
        }
    }

    pub async fn run(
        &self,
        session: &SessionHandle,
        submission: &Submission,
        task: &TaskRecord,
    ) -> DynamicRun {
        let mut state = PageState::NotStarted;

        let page = match self.load(session, &submission.pages_url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %submission.pages_url, error = %e, "page failed to load");
                state.advance(PageState::LoadFailed);
                let msg = e.to_string();
                let result = CheckOutcome::LookupFailed {
                    reason: format!("Error loading page: {}", msg),
                    logs: msg,
                }
                .into_result(DYNAMIC_LOAD_CHECK);
                return DynamicRun {
                    state,
                    results: vec![result],
                };
            }
        };
        state.advance(PageState::PageLoaded);

        let mut results = Vec::with_capacity(task.checks.len());
        for spec in &task.checks {
            let outcome = match spec {
                CheckSpec::Scripted(code) => self.run_script(&page, code).await,
                CheckSpec::Descriptive(_) => descriptive_outcome(),
            };
            let result = outcome.into_result(task_check_name(spec));
            debug!(check = %result.check, score = result.score, "dynamic check done");
            results.push(result);
        }
        state.advance(PageState::ChecksRun);

        self.close(page).await;
        state.advance(PageState::Closed);

        DynamicRun { state, results }
    }

    /// Open a tab and navigate it. A tab that opened but failed to load is closed again.
    async fn load(&self, session: &SessionHandle, url: &str) -> Result<PageHandle, BrowserError> {
        let page = bounded(
            self.page_load_timeout,
            "open page",
            self.driver.new_page(session),
        )
        .await?;

        let navigation = bounded(
            self.page_load_timeout,
            &format!("navigate {}", url),
            self.driver.navigate(&page, url, self.page_load_timeout),
        )
        .await;

        match navigation {
            Ok(()) => Ok(page),
            Err(e) => {
                self.close(page).await;
                Err(e)
            }
        }
    }

    async fn run_script(&self, page: &PageHandle, code: &str) -> CheckOutcome {
        let evaluated = bounded(
            self.script_timeout,
            "script",
            self.driver.evaluate_script(page, code),
        )
        .await;

        match evaluated {
            Ok(value) => {
                let logs = format!("Result: {}", display_value(&value));
                if is_truthy(&value) {
                    CheckOutcome::pass("Check passed", logs)
                } else {
                    CheckOutcome::fail("Check failed", logs)
                }
            }
            Err(e) => CheckOutcome::error(e),
        }
    }

    async fn close(&self, page: PageHandle) {
        let closed = bounded(self.page_load_timeout, "close page", self.driver.close_page(page)).await;
        if let Err(e) = closed {
            warn!(error = %e, "failed to close page");
        }
    }
}

/// Run a driver call under `limit`; an elapsed limit becomes [`BrowserError::Timeout`].
pub(crate) async fn bounded<T>(
    limit: Duration,
    operation: &str,
    call: impl Future<Output = Result<T, BrowserError>>,
) -> Result<T, BrowserError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| {
            Err(BrowserError::Timeout {
                operation: operation.to_string(),
                after: limit,
            })
        })
}

/// null, false, 0, "", [] and {} are falsy; anything else passes.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
