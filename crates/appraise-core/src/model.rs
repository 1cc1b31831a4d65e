use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix marking a task check as a script to run against the rendered page.
pub const SCRIPTED_CHECK_PREFIX: &str = "js:";

/// Placeholder score for results that need a human look (descriptive checks,
/// unparseable rubric responses).
pub const MANUAL_REVIEW_SCORE: f64 = 0.5;

/// Iteration of a task: the initial brief or the follow-up revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Round {
    First,
    Second,
}

impl Round {
    pub fn number(self) -> u8 {
        match self {
            Round::First => 1,
            Round::Second => 2,
        }
    }
}

impl TryFrom<u8> for Round {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Round::First),
            2 => Ok(Round::Second),
            other => Err(format!("invalid round {} (expected 1 or 2)", other)),
        }
    }
}

impl From<Round> for u8 {
    fn from(r: Round) -> Self {
        r.number()
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// The (actor, task, round) triple. Idempotency and task lookup are keyed on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionKey {
    pub email: String,
    pub task: String,
    pub round: Round,
}

impl fmt::Display for SubmissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} (Round {})", self.email, self.task, self.round)
    }
}

/// One deployed artifact. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub email: String,
    pub task: String,
    pub round: Round,
    pub nonce: String,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn key(&self) -> SubmissionKey {
        SubmissionKey {
            email: self.email.clone(),
            task: self.task.clone(),
            round: self.round,
        }
    }
}

/// A task-specific check, classified once when the task is authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CheckSpec {
    /// Expression evaluated in the page; truthy passes.
    Scripted(String),
    /// Free-text requirement that cannot be automated.
    Descriptive(String),
}

impl CheckSpec {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(SCRIPTED_CHECK_PREFIX) {
            Some(code) => CheckSpec::Scripted(code.trim().to_string()),
            None => CheckSpec::Descriptive(raw.to_string()),
        }
    }

    pub fn is_scripted(&self) -> bool {
        matches!(self, CheckSpec::Scripted(_))
    }
}

impl From<String> for CheckSpec {
    fn from(raw: String) -> Self {
        CheckSpec::parse(&raw)
    }
}

impl From<CheckSpec> for String {
    fn from(spec: CheckSpec) -> Self {
        match spec {
            CheckSpec::Scripted(code) => format!("{} {}", SCRIPTED_CHECK_PREFIX, code),
            CheckSpec::Descriptive(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// The brief that was sent to an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub email: String,
    pub task: String,
    pub round: Round,
    pub nonce: String,
    pub brief: String,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub evaluation_url: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "Utc::now")]
    pub sent_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn key(&self) -> SubmissionKey {
        SubmissionKey {
            email: self.email.clone(),
            task: self.task.clone(),
            round: self.round,
        }
    }
}

/// One scored judgment about a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: String,
    pub score: f64,
    pub reason: String,
    pub logs: String,
}

impl CheckResult {
    pub fn new(
        check: impl Into<String>,
        score: f64,
        reason: impl Into<String>,
        logs: impl Into<String>,
    ) -> Self {
        Self {
            check: check.into(),
            score: clamp_score(score),
            reason: reason.into(),
            logs: logs.into(),
        }
    }

    pub fn passed(&self, threshold: f64) -> bool {
        self.score >= threshold
    }
}

pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// What a single check observed, before the scoring policy is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Scored {
        score: f64,
        reason: String,
        logs: String,
    },
    /// File, repository or page lookup failed.
    LookupFailed { reason: String, logs: String },
    /// The scoring model answered but no result could be extracted.
    Unparseable { reason: String, logs: String },
    /// Not automatable; left to a human.
    ManualReview { reason: String },
}

impl CheckOutcome {
    pub fn pass(reason: impl Into<String>, logs: impl Into<String>) -> Self {
        CheckOutcome::Scored {
            score: 1.0,
            reason: reason.into(),
            logs: logs.into(),
        }
    }

    pub fn fail(reason: impl Into<String>, logs: impl Into<String>) -> Self {
        CheckOutcome::Scored {
            score: 0.0,
            reason: reason.into(),
            logs: logs.into(),
        }
    }

    /// Lookup failure carrying an error; reason is `Error: <msg>`, logs the bare message.
    pub fn error(err: impl fmt::Display) -> Self {
        let msg = err.to_string();
        CheckOutcome::LookupFailed {
            reason: format!("Error: {}", msg),
            logs: msg,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            CheckOutcome::Scored { score, .. } => clamp_score(*score),
            CheckOutcome::LookupFailed { .. } => 0.0,
            CheckOutcome::Unparseable { .. } | CheckOutcome::ManualReview { .. } => {
                MANUAL_REVIEW_SCORE
            }
        }
    }

    pub fn into_result(self, check: impl Into<String>) -> CheckResult {
        let score = self.score();
        let (reason, logs) = match self {
            CheckOutcome::Scored { reason, logs, .. }
            | CheckOutcome::LookupFailed { reason, logs }
            | CheckOutcome::Unparseable { reason, logs } => (reason, logs),
            CheckOutcome::ManualReview { reason } => (reason, String::new()),
        };
        CheckResult::new(check, score, reason, logs)
    }
}

/// A persisted result together with the submission it judged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCheckResult {
    pub email: String,
    pub task: String,
    pub round: Round,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
    pub evaluated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: CheckResult,
}
