use super::{LlmClient, LlmResponse};
use async_trait::async_trait;

/// Deterministic client for tests and dry runs.
#[derive(Debug)]
pub struct FakeClient {
    model: String,
    fixed_response: Option<String>,
}

impl FakeClient {
    pub fn new(model: String) -> Self {
        Self {
            model,
            fixed_response: None,
        }
    }

    pub fn with_response(mut self, response: String) -> Self {
        self.fixed_response = Some(response);
        self
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, _prompt: &str, _system: Option<&str>) -> anyhow::Result<LlmResponse> {
        let text = self
            .fixed_response
            .clone()
            .unwrap_or_else(|| r#"{"score": 0.5, "reason": "fake provider"}"#.to_string());

        Ok(LlmResponse {
            text,
            provider: "fake".to_string(),
            model: self.model.clone(),
            meta: serde_json::json!({}),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
