use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::checks::expected_result_count;
use crate::config::EvaluationSettings;
use crate::inspect::{DynamicInspector, StaticInspector};
use crate::model::{CheckResult, Submission, SubmissionKey, TaskRecord};
use crate::providers::browser::{BrowserDriver, SessionHandle};
use crate::providers::llm::LlmClient;
use crate::providers::repo::RepoContent;
use crate::storage::Store;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Freshly computed and persisted.
    Evaluated(Vec<CheckResult>),
    /// Results already exist for the (email, task, round) key.
    AlreadyEvaluated,
    MissingTask,
}

impl SubmissionOutcome {
    pub fn results(&self) -> Option<&[CheckResult]> {
        match self {
            SubmissionOutcome::Evaluated(results) => Some(results),
            _ => None,
        }
    }
}

/// Evaluates one submission: static checks, then dynamic checks, then one
/// transactional write.
pub struct Evaluator {
    store: Store,
    static_inspector: StaticInspector,
    dynamic_inspector: DynamicInspector,
}

impl Evaluator {
    pub fn new(
        store: Store,
        repo: Arc<dyn RepoContent>,
        llm: Arc<dyn LlmClient>,
        browser: Arc<dyn BrowserDriver>,
        settings: &EvaluationSettings,
    ) -> Self {
        Self {
            store,
            static_inspector: StaticInspector::new(repo, llm, settings),
            dynamic_inspector: DynamicInspector::new(browser, settings),
        }
    }

    /// Look up the task for `submission` and evaluate it unless results exist.
    pub async fn evaluate_submission(
        &self,
        session: &SessionHandle,
        submission: &Submission,
    ) -> anyhow::Result<SubmissionOutcome> {
        let key = submission.key();

        if self.already_evaluated(&key)? {
            return Ok(SubmissionOutcome::AlreadyEvaluated);
        }

        let Some(task) = self
            .store
            .find_task_record(&key)
            .with_context(|| format!("look up task for {}", key))?
        else {
            warn!(submission = %key, "no task record for submission, skipping");
            return Ok(SubmissionOutcome::MissingTask);
        };

        self.evaluate(session, submission, &task).await
    }

    /// Evaluate against a known task. A key that already has results is left
    /// untouched.
    pub async fn evaluate(
        &self,
        session: &SessionHandle,
        submission: &Submission,
        task: &TaskRecord,
    ) -> anyhow::Result<SubmissionOutcome> {
        if self.already_evaluated(&submission.key())? {
            return Ok(SubmissionOutcome::AlreadyEvaluated);
        }
        let results = self.run_checks(session, submission, task).await?;
        Ok(SubmissionOutcome::Evaluated(results))
    }

    fn already_evaluated(&self, key: &SubmissionKey) -> anyhow::Result<bool> {
        let existing = self
            .store
            .count_check_results(key)
            .with_context(|| format!("count results for {}", key))?;
        Ok(existing > 0)
    }

    async fn run_checks(
        &self,
        session: &SessionHandle,
        submission: &Submission,
        task: &TaskRecord,
    ) -> anyhow::Result<Vec<CheckResult>> {
        let key = submission.key();
        info!(submission = %key, pages_url = %submission.pages_url, "evaluating");

        let mut results = self.static_inspector.run_all(submission, task).await;
        let dynamic = self.dynamic_inspector.run(session, submission, task).await;
        debug_assert_eq!(
            results.len() + dynamic.results.len(),
            expected_result_count(task, dynamic.page_loaded())
        );
        results.extend(dynamic.results);

        self.store
            .append_check_results(submission, &results)
            .with_context(|| format!("persist results for {}", key))?;

        info!(
            submission = %key,
            checks = results.len(),
            mean_score = mean_score(&results),
            "evaluation stored"
        );
        Ok(results)
    }
}

/// Arithmetic mean of the scores; 0.0 when there are none.
pub fn mean_score(results: &[CheckResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64
}
