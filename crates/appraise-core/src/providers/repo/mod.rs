//! Repository content accessor.

pub mod github;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::{RepoError, RepoResult};

pub use github::GitHubClient;

/// Owner and name of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Derive owner/name from a repository URL.
    ///
    /// `https://github.com/<owner>/<name>[.git]` yields both parts. Any other
    /// shape uses the last path segment as the name and `default_owner` as
    /// the owner, the way submissions published under the evaluator's account
    /// are addressed.
    pub fn parse(url: &str, default_owner: Option<&str>) -> RepoResult<Self> {
        let invalid = |reason: &str| RepoError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = url.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(invalid("empty url"));
        }

        if let Ok(parsed) = url::Url::parse(trimmed) {
            let segments: Vec<&str> = parsed
                .path_segments()
                .map(|s| s.filter(|p| !p.is_empty()).collect())
                .unwrap_or_default();
            if parsed.host_str() == Some("github.com") && segments.len() >= 2 {
                return Ok(Self {
                    owner: segments[0].to_string(),
                    name: segments[1].to_string(),
                });
            }
        }

        let name = trimmed
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("no repository name"))?;
        let owner = default_owner
            .filter(|o| !o.is_empty())
            .ok_or_else(|| invalid("owner not in url and no default owner configured"))?;

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Read-only view of a hosted repository.
#[async_trait]
pub trait RepoContent: Send + Sync {
    /// File text at `commit`; `Ok(None)` when the file does not exist.
    async fn file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        commit: &str,
    ) -> RepoResult<Option<String>>;

    async fn repo_created_at(&self, repo: &RepoRef) -> RepoResult<DateTime<Utc>>;

    /// Owner used when a submission URL does not name one.
    fn default_owner(&self) -> Option<&str> {
        None
    }
}
