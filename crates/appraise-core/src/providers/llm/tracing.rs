use super::{LlmClient, LlmResponse};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info_span, Instrument};

/// Wraps a client in a request span recording model, latency and failures.
/// Prompts are never recorded.
pub struct TracingLlmClient {
    inner: Arc<dyn LlmClient>,
}

impl TracingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LlmClient for TracingLlmClient {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> anyhow::Result<LlmResponse> {
        let span = info_span!(
            "llm.request",
            "llm.provider" = self.inner.provider_name(),
            "llm.prompt_chars" = prompt.chars().count(),
            "llm.model" = tracing::field::Empty,
            "llm.latency_ms" = tracing::field::Empty,
            "error" = tracing::field::Empty,
            "error.message" = tracing::field::Empty
        );

        async move {
            let start = std::time::Instant::now();
            let result = self.inner.complete(prompt, system).await;
            let span = tracing::Span::current();
            span.record("llm.latency_ms", start.elapsed().as_millis() as u64);

            match &result {
                Ok(resp) => {
                    span.record("llm.model", resp.model.as_str());
                }
                Err(e) => {
                    span.record("error", true);
                    span.record("error.message", e.to_string().as_str());
                    tracing::debug!(error = %e, "llm request failed");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
