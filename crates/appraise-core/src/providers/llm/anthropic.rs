use super::{LlmClient, LlmResponse};
use crate::config::LlmSettings;
use async_trait::async_trait;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(settings: &LlmSettings, api_key: String) -> anyhow::Result<Self> {
        let base_url = settings
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            model: settings.model.clone(),
            api_key,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            base_url,
            client: super::http_client(settings.timeout_secs)?,
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> anyhow::Result<LlmResponse> {
        let url = format!("{}/messages", self.base_url);

        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "system": system.unwrap_or(""),
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_else(|_| String::new());
            anyhow::bail!("Anthropic messages API error (status {}): {}", status, error_text);
        }

        let json: serde_json::Value = resp.json().await?;
        // concatenate text blocks; tool/other blocks are ignored
        let text = json
            .get("content")
            .and_then(|c| c.as_array())
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Anthropic API response missing text content"))?;

        Ok(LlmResponse {
            text,
            provider: "anthropic".to_string(),
            model: self.model.clone(),
            meta: json!({ "usage": json.get("usage").cloned().unwrap_or_default() }),
        })
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }
}
