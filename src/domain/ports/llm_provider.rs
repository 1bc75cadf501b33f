//! LLM provider port - interface for chat-completion backends.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GenerationRequest, LlmResponse, ModelInfo, ProviderKind};

/// Trait for LLM provider implementations.
///
/// A provider serves a fixed catalog of models. Implementations perform a
/// single attempt per call; failures are reported as
/// [`DomainError::ProviderCall`].
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> ProviderKind;

    /// Static model catalog.
    fn models(&self) -> &[ModelInfo];

    /// Whether `model` is in this provider's catalog.
    fn supports_model(&self, model: &str) -> bool {
        self.models().iter().any(|m| m.id == model)
    }

    /// Fail with [`DomainError::ModelNotAvailable`] unless `model` is served here.
    fn validate_model(&self, model: &str) -> DomainResult<()> {
        if self.supports_model(model) {
            Ok(())
        } else {
            Err(DomainError::ModelNotAvailable {
                model: model.to_string(),
                provider: self.kind().to_string(),
                available: self.models().iter().map(|m| m.id.clone()).collect(),
            })
        }
    }

    /// Run a chat completion to completion.
    async fn generate(&self, request: GenerationRequest) -> DomainResult<LlmResponse>;

    /// Run a streaming chat completion.
    ///
    /// Returns a channel receiver yielding text deltas. The channel closes
    /// when the backend signals completion; a transport error mid-stream is
    /// delivered as a final `Err` item.
    async fn stream_generate(
        &self,
        request: GenerationRequest,
    ) -> DomainResult<mpsc::Receiver<DomainResult<String>>>;
}
