use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tracing::{error, info, warn};

use super::orchestrator::{mean_score, Evaluator, SubmissionOutcome};
use crate::inspect::dynamic::bounded;
use crate::model::SubmissionKey;
use crate::providers::browser::{BrowserDriver, SessionHandle};
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::storage::Store;

/// Upper bound on tearing down the browser session after a batch.
pub const SESSION_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    Evaluated { checks: usize, mean_score: f64 },
    AlreadyEvaluated,
    MissingTask,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReport {
    pub key: SubmissionKey,
    #[serde(flatten)]
    pub status: SubmissionStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub evaluated: usize,
    pub skipped_existing: usize,
    pub skipped_missing_task: usize,
    pub failed: usize,
    pub reports: Vec<SubmissionReport>,
}

impl BatchSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Evaluates every stored submission inside one browser session.
pub struct BatchRunner {
    store: Store,
    evaluator: Evaluator,
    browser: Arc<dyn BrowserDriver>,
    progress: Option<ProgressSink>,
}

impl BatchRunner {
    pub fn new(store: Store, evaluator: Evaluator, browser: Arc<dyn BrowserDriver>) -> Self {
        Self {
            store,
            evaluator,
            browser,
            progress: None,
        }
    }

    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Fails only when the session cannot be opened or submissions cannot be
    /// listed. The session is closed on every path after it opened.
    pub async fn run_all(&self) -> anyhow::Result<BatchSummary> {
        let session = self
            .browser
            .open_session()
            .await
            .context("failed to open browser session")?;
        info!(session = %session.id, "browser session opened");

        let outcome = self.run_in_session(&session).await;

        let closed = bounded(
            SESSION_CLOSE_TIMEOUT,
            "close browser session",
            self.browser.close_session(session),
        )
        .await;
        if let Err(e) = closed {
            warn!(error = %e, "failed to close browser session");
        }
        outcome
    }

    async fn run_in_session(&self, session: &SessionHandle) -> anyhow::Result<BatchSummary> {
        let submissions = self
            .store
            .find_submissions_all()
            .context("list submissions")?;

        let mut summary = BatchSummary {
            total: submissions.len(),
            ..BatchSummary::default()
        };
        info!(total = summary.total, "starting batch evaluation");

        for (idx, submission) in submissions.iter().enumerate() {
            let key = submission.key();
            self.emit(ProgressEvent::Started {
                index: idx + 1,
                total: summary.total,
                key: &key,
            });

            let status = match self.evaluator.evaluate_submission(session, submission).await {
                Ok(SubmissionOutcome::Evaluated(results)) => {
                    summary.evaluated += 1;
                    self.emit(ProgressEvent::Evaluated {
                        key: &key,
                        results: &results,
                    });
                    SubmissionStatus::Evaluated {
                        checks: results.len(),
                        mean_score: mean_score(&results),
                    }
                }
                Ok(SubmissionOutcome::AlreadyEvaluated) => {
                    summary.skipped_existing += 1;
                    SubmissionStatus::AlreadyEvaluated
                }
                Ok(SubmissionOutcome::MissingTask) => {
                    summary.skipped_missing_task += 1;
                    SubmissionStatus::MissingTask
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(submission = %key, error = ?e, "evaluation failed");
                    let error = format!("{:#}", e);
                    self.emit(ProgressEvent::Failed {
                        key: &key,
                        error: &error,
                    });
                    SubmissionStatus::Failed { error }
                }
            };
            summary.reports.push(SubmissionReport { key, status });
        }

        info!(
            evaluated = summary.evaluated,
            skipped_existing = summary.skipped_existing,
            skipped_missing_task = summary.skipped_missing_task,
            failed = summary.failed,
            "batch evaluation finished"
        );
        Ok(summary)
    }

    fn emit(&self, event: ProgressEvent<'_>) {
        if let Some(sink) = &self.progress {
            sink(event);
        }
    }
}
