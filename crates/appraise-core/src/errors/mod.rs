//! Error types at the collaborator boundaries.
//!
//! Check code never propagates these: inspectors turn them into
//! [`CheckOutcome`](crate::model::CheckOutcome)s. They surface only where the
//! batch cannot continue (browser session, store listing) or in the CLI.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);

/// Repository content accessor errors.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("invalid repository url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("not found: {resource}")]
    NotFound { resource: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

impl RepoError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network { .. })
    }
}

impl From<reqwest::Error> for RepoError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Headless browser driver errors.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("failed to start browser session: {0}")]
    Session(String),

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("timed out after {}ms: {operation}", .after.as_millis())]
    Timeout { operation: String, after: Duration },

    #[error("script error: {0}")]
    Script(String),

    #[error("webdriver protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for BrowserError {
    fn from(err: reqwest::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

pub type BrowserResult<T> = Result<T, BrowserError>;

/// Rejections when registering tasks and submissions.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("no matching task for {email} - {task} (round {round}, nonce {nonce})")]
    NoMatchingTask {
        email: String,
        task: String,
        round: u8,
        nonce: String,
    },

    #[error("submission already received for {email} - {task} (round {round})")]
    DuplicateSubmission {
        email: String,
        task: String,
        round: u8,
    },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
