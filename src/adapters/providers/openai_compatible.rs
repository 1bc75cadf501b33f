//! OpenAI-compatible chat-completion provider.
//!
//! OpenAI, DeepSeek and Kimi (Moonshot) expose the same
//! `POST {base_url}/chat/completions` contract, so one implementation is
//! parameterised by [`ProviderKind`] for endpoint, credentials and catalog.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use super::catalog;
use super::sse::{parse_sse_line, LineBuffer, SseEvent};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ChatMessage, GenerationRequest, LlmResponse, ModelInfo, ProviderCredentials, ProviderKind,
};
use crate::domain::ports::LlmProvider;

/// Configuration for an OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl OpenAiCompatibleConfig {
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            base_url: kind.default_base_url().to_string(),
            timeout_secs: 120,
        }
    }

    /// Build from configured credentials, falling back to the kind's
    /// environment variables. Returns `None` when no usable key exists.
    pub fn from_credentials(
        kind: ProviderKind,
        credentials: &ProviderCredentials,
        timeout_secs: u64,
    ) -> Option<Self> {
        let api_key = credentials
            .api_key
            .clone()
            .filter(|k| is_usable_key(k))
            .or_else(|| {
                kind.api_key_env_vars()
                    .iter()
                    .filter_map(|var| std::env::var(var).ok())
                    .find(|k| is_usable_key(k))
            })?;

        let mut config = Self::new(kind, api_key).with_timeout(timeout_secs);
        if let Some(base_url) = &credentials.base_url {
            config = config.with_base_url(base_url.clone());
        }
        Some(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Empty keys and `your_..._here` placeholders count as absent.
pub fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && !(key.starts_with("your_") && key.ends_with("_here"))
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u64,
}

/// Provider speaking the OpenAI chat-completions protocol.
pub struct OpenAiCompatibleProvider {
    config: OpenAiCompatibleConfig,
    client: Client,
    models: Vec<ModelInfo>,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatibleConfig) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                DomainError::ValidationFailed(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            models: catalog::models_for(config.kind),
            config,
            client,
        })
    }

    fn call_error(&self, model: &str, message: impl Into<String>) -> DomainError {
        DomainError::ProviderCall {
            provider: self.config.kind.to_string(),
            model: model.to_string(),
            message: message.into(),
        }
    }

    async fn send(&self, request: &GenerationRequest, stream: bool) -> DomainResult<reqwest::Response> {
        self.validate_model(&request.model)?;

        let body = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            stream,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.call_error(&request.model, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.call_error(&request.model, format!("HTTP {status}: {body}")));
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn kind(&self) -> ProviderKind {
        self.config.kind
    }

    fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    async fn generate(&self, request: GenerationRequest) -> DomainResult<LlmResponse> {
        let started = Instant::now();
        let response = self.send(&request, false).await?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| self.call_error(&request.model, format!("invalid response body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| self.call_error(&request.model, "response contained no choices"))?;

        tracing::debug!(
            provider = %self.config.kind,
            model = %request.model,
            chars = content.len(),
            "chat completion received"
        );

        Ok(LlmResponse {
            content,
            model_used: request.model,
            provider: self.config.kind,
            tokens_used: parsed.usage.map(|u| u.total_tokens),
            response_time: started.elapsed().as_secs_f64(),
        })
    }

    async fn stream_generate(
        &self,
        request: GenerationRequest,
    ) -> DomainResult<mpsc::Receiver<DomainResult<String>>> {
        let response = self.send(&request, true).await?;
        let (tx, rx) = mpsc::channel(64);
        let provider = self.config.kind.to_string();
        let model = request.model;

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut lines = LineBuffer::new();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx
                            .send(Err(DomainError::ProviderCall {
                                provider: provider.clone(),
                                model: model.clone(),
                                message: format!("stream interrupted: {e}"),
                            }))
                            .await;
                        return;
                    }
                };

                for line in lines.push(&chunk) {
                    match parse_sse_line(&line) {
                        SseEvent::Delta(text) => {
                            if tx.send(Ok(text)).await.is_err() {
                                return;
                            }
                        }
                        SseEvent::Done => return,
                        SseEvent::Skip => {}
                    }
                }
            }

            if let Some(SseEvent::Delta(text)) = lines.finish().as_deref().map(parse_sse_line) {
                let _ = tx.send(Ok(text)).await;
            }
        });

        Ok(rx)
    }
}
