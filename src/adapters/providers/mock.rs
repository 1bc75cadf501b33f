//! Scripted mock provider for testing.
//!
//! Replies are chosen by the first rule whose needle occurs in the
//! request's concatenated messages; unmatched requests get the default
//! reply. Every request is recorded for later assertions.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

use super::catalog;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GenerationRequest, LlmResponse, ModelInfo, ProviderKind};
use crate::domain::ports::LlmProvider;

/// Mock response configuration.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Output text
    pub output: String,
    /// Whether to simulate failure
    pub fail: bool,
    /// Error message if failing
    pub error_message: Option<String>,
    /// Simulated latency
    pub delay: Option<Duration>,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            output: "Mock analysis completed successfully.".to_string(),
            fail: false,
            error_message: None,
            delay: None,
        }
    }
}

impl MockResponse {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            fail: true,
            error_message: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Mock provider for testing.
pub struct MockProvider {
    kind: ProviderKind,
    models: Vec<ModelInfo>,
    default_response: MockResponse,
    rules: Arc<RwLock<Vec<(String, MockResponse)>>>,
    calls: Arc<RwLock<Vec<GenerationRequest>>>,
}

impl MockProvider {
    /// A mock serving the OpenAI catalog.
    pub fn new() -> Self {
        Self::with_kind(ProviderKind::OpenAi)
    }

    pub fn with_kind(kind: ProviderKind) -> Self {
        Self {
            kind,
            models: catalog::models_for(kind),
            default_response: MockResponse::default(),
            rules: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Replace the catalog this mock advertises.
    pub fn with_models(mut self, models: Vec<ModelInfo>) -> Self {
        self.models = models;
        self
    }

    pub fn with_default_response(mut self, response: MockResponse) -> Self {
        self.default_response = response;
        self
    }

    /// Reply with `response` to any request whose text contains `needle`.
    /// Rules are checked in insertion order.
    pub async fn respond_when(&self, needle: impl Into<String>, response: MockResponse) {
        self.rules.write().await.push((needle.into(), response));
    }

    /// All requests received so far.
    pub async fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Requests whose text contains `needle`.
    pub async fn calls_matching(&self, needle: &str) -> Vec<GenerationRequest> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|r| r.prompt_text().contains(needle))
            .cloned()
            .collect()
    }

    async fn respond(&self, request: &GenerationRequest) -> DomainResult<String> {
        self.calls.write().await.push(request.clone());

        let text = request.prompt_text();
        let response = self
            .rules
            .read()
            .await
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map_or_else(|| self.default_response.clone(), |(_, r)| r.clone());

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        if response.fail {
            return Err(DomainError::ProviderCall {
                provider: self.kind.to_string(),
                model: request.model.clone(),
                message: response
                    .error_message
                    .unwrap_or_else(|| "Mock failure".to_string()),
            });
        }

        Ok(response.output)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    async fn generate(&self, request: GenerationRequest) -> DomainResult<LlmResponse> {
        self.validate_model(&request.model)?;
        let content = self.respond(&request).await?;

        Ok(LlmResponse {
            content,
            model_used: request.model,
            provider: self.kind,
            tokens_used: None,
            response_time: 0.0,
        })
    }

    async fn stream_generate(
        &self,
        request: GenerationRequest,
    ) -> DomainResult<mpsc::Receiver<DomainResult<String>>> {
        self.validate_model(&request.model)?;
        let content = self.respond(&request).await?;

        let words: Vec<String> = content
            .split_inclusive(' ')
            .map(ToString::to_string)
            .collect();
        let (tx, rx) = mpsc::channel(words.len().max(1));
        for word in words {
            let _ = tx.send(Ok(word)).await;
        }
        Ok(rx)
    }
}
