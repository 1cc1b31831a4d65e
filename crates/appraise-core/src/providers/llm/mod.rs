pub mod anthropic;
pub mod fake;
pub mod openai;
pub mod tracing;

use crate::config::LlmSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

/// Generative scoring collaborator: raw model text in, raw model text out.
/// Callers parse whatever structure they need from `text`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> anyhow::Result<LlmResponse>;

    fn provider_name(&self) -> &'static str;
}

pub(crate) fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create HTTP client: {}", e))
}

/// Build the configured provider, wrapped in request tracing.
pub fn build_client(settings: &LlmSettings) -> anyhow::Result<Arc<dyn LlmClient>> {
    let api_key = || {
        settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "config error: llm provider '{}' needs an API key (set LLM_API_KEY)",
                    settings.provider
                )
            })
    };

    let inner: Arc<dyn LlmClient> = match settings.provider.as_str() {
        "openai" => Arc::new(openai::OpenAIClient::new(settings, api_key()?)?),
        "anthropic" => Arc::new(anthropic::AnthropicClient::new(settings, api_key()?)?),
        "fake" => Arc::new(fake::FakeClient::new(settings.model.clone())),
        other => anyhow::bail!(
            "config error: unsupported llm provider '{}' (expected openai, anthropic or fake)",
            other
        ),
    };
    Ok(Arc::new(self::tracing::TracingLlmClient::new(inner)))
}
