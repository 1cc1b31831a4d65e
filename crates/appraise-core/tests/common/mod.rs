#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use appraise_core::config::EvaluationSettings;
use appraise_core::errors::{BrowserError, BrowserResult, RepoError, RepoResult};
use appraise_core::model::{CheckSpec, Round, Submission, TaskRecord};
use appraise_core::providers::browser::{BrowserDriver, PageHandle, SessionHandle};
use appraise_core::providers::llm::fake::FakeClient;
use appraise_core::providers::llm::LlmClient;
use appraise_core::providers::repo::{RepoContent, RepoRef};
use appraise_core::{Evaluator, Store};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

pub const MIT: &str = "MIT License\n\nCopyright (c) 2025 Student";
pub const README: &str = "# Sum of Sales\n\nSetup, usage, license.";
pub const INDEX: &str = "<!doctype html><html><body><div id=\"total-sales\">42</div></body></html>";

pub fn sent_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap()
}

pub fn task(email: &str, checks: &[&str]) -> TaskRecord {
    TaskRecord {
        email: email.into(),
        task: "sum-of-sales".into(),
        round: Round::First,
        nonce: format!("nonce-{}", email),
        brief: "Publish a sales summary page".into(),
        checks: checks.iter().map(|c| CheckSpec::parse(c)).collect(),
        attachments: vec![],
        evaluation_url: String::new(),
        endpoint: String::new(),
        sent_at: sent_at(),
    }
}

pub fn submission(email: &str) -> Submission {
    let user = email.split('@').next().unwrap_or(email);
    Submission {
        email: email.into(),
        task: "sum-of-sales".into(),
        round: Round::First,
        nonce: format!("nonce-{}", email),
        repo_url: format!("https://github.com/{}/sum-of-sales", user),
        commit_sha: "abc123".into(),
        pages_url: format!("https://{}.github.io/sum-of-sales/", user),
        submitted_at: sent_at() + chrono::Duration::hours(1),
    }
}

pub fn memory_store() -> Store {
    let store = Store::memory().unwrap();
    store.init_schema().unwrap();
    store
}

/// Repository accessor serving fixed files; every repo shares them.
pub struct MockRepo {
    pub created_at: Option<DateTime<Utc>>,
    pub files: HashMap<String, String>,
}

impl MockRepo {
    pub fn complete() -> Self {
        let files = [("LICENSE", MIT), ("README.md", README), ("index.html", INDEX)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            created_at: Some(sent_at() + chrono::Duration::minutes(5)),
            files,
        }
    }

    pub fn with_file(mut self, path: &str, content: Option<&str>) -> Self {
        match content {
            Some(c) => self.files.insert(path.to_string(), c.to_string()),
            None => self.files.remove(path),
        };
        self
    }
}

#[async_trait]
impl RepoContent for MockRepo {
    async fn file_content(
        &self,
        _repo: &RepoRef,
        path: &str,
        _commit: &str,
    ) -> RepoResult<Option<String>> {
        Ok(self.files.get(path).cloned())
    }

    async fn repo_created_at(&self, repo: &RepoRef) -> RepoResult<DateTime<Utc>> {
        self.created_at.ok_or_else(|| RepoError::NotFound {
            resource: repo.to_string(),
        })
    }
}

pub fn llm(reply: &str) -> Arc<dyn LlmClient> {
    Arc::new(FakeClient::new("fake-model".into()).with_response(reply.into()))
}

#[derive(Debug, Clone)]
pub enum PageBehavior {
    Load,
    FailNavigation,
    Hang,
}

/// Browser fake keyed by page URL and script source.
#[derive(Default)]
pub struct MockBrowser {
    pub fail_open: bool,
    /// 1-based `new_page` call that never answers.
    pub hang_new_page_at: Option<usize>,
    pub pages: HashMap<String, PageBehavior>,
    pub scripts: HashMap<String, Result<Value, String>>,
    pub events: Mutex<Vec<String>>,
}

impl MockBrowser {
    pub fn with_page(mut self, url: &str, behavior: PageBehavior) -> Self {
        self.pages.insert(url.to_string(), behavior);
        self
    }

    pub fn with_script(mut self, code: &str, outcome: Result<Value, &str>) -> Self {
        self.scripts
            .insert(code.to_string(), outcome.map_err(str::to_string));
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }

    fn record(&self, event: &str) {
        self.events.lock().unwrap().push(event.to_string());
    }
}

#[async_trait]
impl BrowserDriver for MockBrowser {
    async fn open_session(&self) -> BrowserResult<SessionHandle> {
        if self.fail_open {
            return Err(BrowserError::Session("chromedriver not reachable".into()));
        }
        self.record("open_session");
        Ok(SessionHandle { id: "session-1".into() })
    }

    async fn close_session(&self, _session: SessionHandle) -> BrowserResult<()> {
        self.record("close_session");
        Ok(())
    }

    async fn new_page(&self, session: &SessionHandle) -> BrowserResult<PageHandle> {
        self.record("new_page");
        if self.hang_new_page_at == Some(self.count("new_page")) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(PageHandle {
            session_id: session.id.clone(),
            handle: "tab".into(),
        })
    }

    async fn navigate(&self, _page: &PageHandle, url: &str, _timeout: Duration) -> BrowserResult<()> {
        match self.pages.get(url).cloned().unwrap_or(PageBehavior::Load) {
            PageBehavior::Load => Ok(()),
            PageBehavior::FailNavigation => Err(BrowserError::Navigation {
                url: url.into(),
                message: "net::ERR_NAME_NOT_RESOLVED".into(),
            }),
            PageBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            }
        }
    }

    async fn evaluate_script(&self, _page: &PageHandle, code: &str) -> BrowserResult<Value> {
        match self.scripts.get(code) {
            Some(Ok(v)) => Ok(v.clone()),
            Some(Err(msg)) => Err(BrowserError::Script(msg.clone())),
            None => Ok(Value::Bool(true)),
        }
    }

    async fn close_page(&self, _page: PageHandle) -> BrowserResult<()> {
        self.record("close_page");
        Ok(())
    }
}

pub fn fast_settings() -> EvaluationSettings {
    EvaluationSettings {
        page_load_timeout_ms: 300,
        script_timeout_ms: 300,
        ..EvaluationSettings::default()
    }
}

pub fn evaluator(
    store: &Store,
    repo: MockRepo,
    reply: &str,
    browser: Arc<MockBrowser>,
) -> Evaluator {
    Evaluator::new(
        store.clone(),
        Arc::new(repo),
        llm(reply),
        browser,
        &fast_settings(),
    )
}
