use std::sync::Arc;

use tracing::debug;

use super::rubric;
use crate::checks::{Rubric, StaticCheck, CODE_RUBRIC, README_RUBRIC};
use crate::config::EvaluationSettings;
use crate::model::{CheckOutcome, CheckResult, Submission, TaskRecord};
use crate::providers::llm::LlmClient;
use crate::providers::repo::{RepoContent, RepoRef};

/// Checks answered from the repository alone.
pub struct StaticInspector {
    repo: Arc<dyn RepoContent>,
    llm: Arc<dyn LlmClient>,
    readme_excerpt_chars: usize,
    code_excerpt_chars: usize,
}

impl StaticInspector {
    pub fn new(
        repo: Arc<dyn RepoContent>,
        llm: Arc<dyn LlmClient>,
        settings: &EvaluationSettings,
    ) -> Self {
        Self {
            repo,
            llm,
            readme_excerpt_chars: settings.readme_excerpt_chars,
            code_excerpt_chars: settings.code_excerpt_chars,
        }
    }

    /// All static checks in registry order.
    pub async fn run_all(&self, submission: &Submission, task: &TaskRecord) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(StaticCheck::ALL.len());
        for check in StaticCheck::ALL {
            let result = match check {
                StaticCheck::RepoCreatedAfterTask => {
                    self.check_temporal_order(submission, task).await
                }
                StaticCheck::License => self.check_license(submission).await,
                StaticCheck::ReadmeQuality => self.check_readme_quality(submission).await,
                StaticCheck::CodeQuality => self.check_code_quality(submission).await,
            };
            debug!(check = %check, score = result.score, "static check done");
            results.push(result);
        }
        results
    }

    fn repo_ref(&self, submission: &Submission) -> Result<RepoRef, CheckOutcome> {
        RepoRef::parse(&submission.repo_url, self.repo.default_owner()).map_err(CheckOutcome::error)
    }

    /// Passes only when the repository was created strictly after the task was sent.
    pub async fn check_temporal_order(
        &self,
        submission: &Submission,
        task: &TaskRecord,
    ) -> CheckResult {
        let outcome = match self.repo_ref(submission) {
            Err(outcome) => outcome,
            Ok(repo) => match self.repo.repo_created_at(&repo).await {
                Err(e) => CheckOutcome::error(e),
                Ok(created) if created > task.sent_at => CheckOutcome::pass(
                    format!("Repo created at {}, task sent at {}", created, task.sent_at),
                    "",
                ),
                Ok(created) => CheckOutcome::fail(
                    format!("Repo created at {} (before task at {})", created, task.sent_at),
                    "",
                ),
            },
        };
        outcome.into_result(StaticCheck::RepoCreatedAfterTask.name())
    }

    pub async fn check_license(&self, submission: &Submission) -> CheckResult {
        let outcome = match self.repo_ref(submission) {
            Err(outcome) => outcome,
            Ok(repo) => match self
                .repo
                .file_content(&repo, "LICENSE", &submission.commit_sha)
                .await
            {
                Err(e) => CheckOutcome::error(e),
                Ok(Some(text)) if text.contains("MIT") => CheckOutcome::pass("MIT LICENSE found", ""),
                Ok(_) => CheckOutcome::fail("MIT LICENSE not found or invalid", ""),
            },
        };
        outcome.into_result(StaticCheck::License.name())
    }

    pub async fn check_readme_quality(&self, submission: &Submission) -> CheckResult {
        self.rubric_check(&README_RUBRIC, submission, self.readme_excerpt_chars)
            .await
            .into_result(README_RUBRIC.check.name())
    }

    pub async fn check_code_quality(&self, submission: &Submission) -> CheckResult {
        self.rubric_check(&CODE_RUBRIC, submission, self.code_excerpt_chars)
            .await
            .into_result(CODE_RUBRIC.check.name())
    }

    async fn rubric_check(
        &self,
        rubric: &Rubric,
        submission: &Submission,
        max_chars: usize,
    ) -> CheckOutcome {
        let repo = match self.repo_ref(submission) {
            Ok(repo) => repo,
            Err(outcome) => return outcome,
        };

        let content = match self
            .repo
            .file_content(&repo, rubric.file, &submission.commit_sha)
            .await
        {
            Ok(Some(text)) if !text.is_empty() => text,
            Ok(_) => {
                return CheckOutcome::LookupFailed {
                    reason: format!("{} not found", rubric.file),
                    logs: String::new(),
                }
            }
            Err(e) => return CheckOutcome::error(e),
        };

        let prompt = rubric::build_prompt(rubric, &content, max_chars);
        match self.llm.complete(&prompt, Some(rubric::SYSTEM_PROMPT)).await {
            Ok(resp) => rubric::parse_rubric_response(&resp.text),
            Err(e) => CheckOutcome::error(e),
        }
    }
}
