//! GitHub REST client for repository metadata and file contents.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use tracing::{debug, warn};

use super::{RepoContent, RepoRef};
use crate::config::GitHubSettings;
use crate::errors::{RepoError, RepoResult};

const USER_AGENT_VALUE: &str = concat!("appraise/", env!("CARGO_PKG_VERSION"));
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
    owner: Option<String>,
    max_retries: u32,
}

impl GitHubClient {
    pub fn new(settings: &GitHubSettings) -> RepoResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        default_headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(API_VERSION),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| RepoError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            token: settings.token.clone().filter(|t| !t.is_empty()),
            owner: settings.owner.clone().filter(|o| !o.is_empty()),
            max_retries: settings.max_retries,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// GET with retry on rate limiting and transport failures.
    async fn get(&self, url: &str, accept: &'static str) -> RepoResult<reqwest::Response> {
        let mut retries = 0;

        loop {
            match self.get_once(url, accept).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    let backoff = backoff_for(&e, retries);
                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying github request"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &str, accept: &'static str) -> RepoResult<reqwest::Response> {
        let mut request = self.client.get(url).header(ACCEPT, accept);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => Ok(response),

            401 | 403 => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(RepoError::Unauthorized {
                    message: format!("HTTP {}: {}", status.as_u16(), message),
                })
            }

            404 => Err(RepoError::NotFound {
                resource: url.to_string(),
            }),

            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(RepoError::RateLimited { retry_after })
            }

            _ => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(RepoError::Network {
                    message: format!("HTTP {}: {}", status.as_u16(), message),
                })
            }
        }
    }
}

/// Exponential backoff with up to 250ms of jitter; `Retry-After` wins when given.
fn backoff_for(err: &RepoError, attempt: u32) -> Duration {
    let base = match err {
        RepoError::RateLimited {
            retry_after: Some(after),
        } => *after,
        _ => Duration::from_secs(1u64 << attempt.saturating_sub(1).min(5)),
    };
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..250));
    (base + jitter).min(MAX_BACKOFF)
}

#[async_trait]
impl RepoContent for GitHubClient {
    async fn file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        commit: &str,
    ) -> RepoResult<Option<String>> {
        let mut url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            repo.owner,
            repo.name,
            path.trim_start_matches('/')
        );
        if !commit.is_empty() {
            url.push_str("?ref=");
            url.push_str(commit);
        }

        match self.get(&url, RAW_MEDIA_TYPE).await {
            Ok(response) => {
                let text = response.text().await?;
                debug!(repo = %repo, path, bytes = text.len(), "fetched file");
                Ok(Some(text))
            }
            Err(RepoError::NotFound { .. }) => {
                debug!(repo = %repo, path, "file not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn repo_created_at(&self, repo: &RepoRef) -> RepoResult<DateTime<Utc>> {
        let url = format!("{}/repos/{}/{}", self.api_url, repo.owner, repo.name);
        let body: serde_json::Value = self
            .get(&url, JSON_MEDIA_TYPE)
            .await?
            .json()
            .await
            .map_err(|e| RepoError::InvalidResponse {
                message: e.to_string(),
            })?;

        let raw = body
            .get("created_at")
            .and_then(|v| v.as_str())
            .ok_or_else(|| RepoError::InvalidResponse {
                message: "missing created_at".to_string(),
            })?;

        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| RepoError::InvalidResponse {
                message: format!("bad created_at '{}': {}", raw, e),
            })
    }

    fn default_owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }
}
