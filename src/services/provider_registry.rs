//! Provider registry: model-to-provider resolution and call dispatch.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::adapters::providers::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    GenerationRequest, LlmConfig, LlmResponse, ModelInfo, ModelSummary, ProviderKind,
    ProviderStatus,
};
use crate::domain::ports::LlmProvider;

/// Holds the configured providers in registration order.
///
/// Resolution is first-match: the first provider whose catalog lists a
/// model serves it, even if a later provider lists it too.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every provider that has a usable API key, in
    /// [`ProviderKind::ALL`] order.
    pub fn from_config(config: &LlmConfig) -> DomainResult<Self> {
        let mut registry = Self::new();

        for kind in ProviderKind::ALL {
            let credentials = match kind {
                ProviderKind::OpenAi => &config.openai,
                ProviderKind::DeepSeek => &config.deepseek,
                ProviderKind::Kimi => &config.kimi,
            };

            match OpenAiCompatibleConfig::from_credentials(kind, credentials, config.timeout_secs) {
                Some(provider_config) => {
                    registry.register(Arc::new(OpenAiCompatibleProvider::new(provider_config)?));
                }
                None => tracing::debug!(provider = %kind, "no API key configured, skipping"),
            }
        }

        if registry.is_empty() {
            tracing::warn!("no LLM providers available; set OPENAI_API_KEY, DEEPSEEK_API_KEY or KIMI_API_KEY");
        }

        Ok(registry)
    }

    /// Append a provider. A second provider of the same kind replaces the first.
    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        let kind = provider.kind();
        self.providers.retain(|p| p.kind() != kind);
        tracing::info!(provider = %kind, models = provider.models().len(), "registered LLM provider");
        self.providers.push(provider);
    }

    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    pub fn provider(&self, kind: ProviderKind) -> Option<Arc<dyn LlmProvider>> {
        self.providers.iter().find(|p| p.kind() == kind).cloned()
    }

    /// First registered provider serving `model`.
    pub fn provider_for_model(&self, model: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.iter().find(|p| p.supports_model(model)).cloned()
    }

    fn resolve(
        &self,
        model: &str,
        explicit: Option<ProviderKind>,
    ) -> DomainResult<Arc<dyn LlmProvider>> {
        let provider = match explicit {
            Some(kind) => self.provider(kind),
            None => self.provider_for_model(model),
        }
        .ok_or_else(|| DomainError::ProviderNotFound {
            model: model.to_string(),
        })?;

        provider.validate_model(model)?;
        tracing::debug!(model, provider = %provider.kind(), "resolved provider");
        Ok(provider)
    }

    /// Generate with an explicit or auto-resolved provider. No retries.
    pub async fn generate(
        &self,
        request: GenerationRequest,
        provider: Option<ProviderKind>,
    ) -> DomainResult<LlmResponse> {
        let provider = self.resolve(&request.model, provider)?;
        provider.generate(request).await
    }

    pub async fn stream_generate(
        &self,
        request: GenerationRequest,
        provider: Option<ProviderKind>,
    ) -> DomainResult<mpsc::Receiver<DomainResult<String>>> {
        let provider = self.resolve(&request.model, provider)?;
        provider.stream_generate(request).await
    }

    /// Models of one provider, or of every registered provider.
    pub fn available_models(&self, filter: Option<ProviderKind>) -> Vec<ModelInfo> {
        self.providers
            .iter()
            .filter(|p| filter.is_none_or(|kind| p.kind() == kind))
            .flat_map(|p| p.models().iter().cloned())
            .collect()
    }

    /// Status of every known provider kind, registered or not.
    pub fn status(&self) -> Vec<ProviderStatus> {
        ProviderKind::ALL
            .iter()
            .map(|&kind| match self.provider(kind) {
                Some(provider) => {
                    let models: Vec<ModelSummary> = provider
                        .models()
                        .iter()
                        .map(|m| ModelSummary {
                            id: m.id.clone(),
                            name: m.name.clone(),
                            context_length: m.context_length,
                        })
                        .collect();
                    ProviderStatus {
                        provider: kind,
                        available: true,
                        model_count: models.len(),
                        models,
                        reason: None,
                    }
                }
                None => ProviderStatus {
                    provider: kind,
                    available: false,
                    model_count: 0,
                    models: Vec::new(),
                    reason: Some("API key not configured".to_string()),
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::providers::{catalog, MockProvider, MockResponse};
    use crate::domain::models::ChatMessage;

    fn request(model: &str) -> GenerationRequest {
        GenerationRequest::new(model, vec![ChatMessage::user("hi")])
    }

    fn two_provider_registry() -> ProviderRegistry {
        ProviderRegistry::new()
            .with_provider(Arc::new(
                MockProvider::new().with_default_response(MockResponse::success("from openai")),
            ))
            .with_provider(Arc::new(
                MockProvider::with_kind(ProviderKind::DeepSeek)
                    .with_default_response(MockResponse::success("from deepseek")),
            ))
    }

    #[tokio::test]
    async fn test_auto_resolves_by_catalog() {
        let registry = two_provider_registry();
        let response = registry.generate(request("deepseek-chat"), None).await.unwrap();
        assert_eq!(response.content, "from deepseek");
        assert_eq!(response.provider, ProviderKind::DeepSeek);
    }

    /// DeepSeek mock that also claims every OpenAI model.
    fn overlapping_deepseek() -> Arc<MockProvider> {
        let mut models = catalog::models_for(ProviderKind::DeepSeek);
        models.extend(catalog::models_for(ProviderKind::OpenAi));
        Arc::new(
            MockProvider::with_kind(ProviderKind::DeepSeek)
                .with_models(models)
                .with_default_response(MockResponse::success("from deepseek")),
        )
    }

    #[tokio::test]
    async fn test_shared_model_goes_to_first_registered() {
        let openai = Arc::new(
            MockProvider::new().with_default_response(MockResponse::success("from openai")),
        );
        let deepseek = overlapping_deepseek();
        let registry = ProviderRegistry::new()
            .with_provider(openai.clone())
            .with_provider(deepseek.clone());

        let response = registry.generate(request("gpt-4o"), None).await.unwrap();

        assert_eq!(response.provider, ProviderKind::OpenAi);
        assert_eq!(openai.call_count().await, 1);
        assert_eq!(deepseek.call_count().await, 0);
        assert_eq!(
            registry.provider_for_model("gpt-4o").map(|p| p.kind()),
            Some(ProviderKind::OpenAi)
        );
    }

    #[tokio::test]
    async fn test_registration_order_decides_shared_model() {
        let deepseek = overlapping_deepseek();
        let registry = ProviderRegistry::new()
            .with_provider(deepseek.clone())
            .with_provider(Arc::new(MockProvider::new()));

        let response = registry.generate(request("gpt-4o"), None).await.unwrap();

        assert_eq!(response.provider, ProviderKind::DeepSeek);
        assert_eq!(response.content, "from deepseek");
        assert_eq!(deepseek.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_model_is_provider_not_found() {
        let registry = two_provider_registry();
        let err = registry.generate(request("llama-3"), None).await.unwrap_err();
        assert!(matches!(err, DomainError::ProviderNotFound { model } if model == "llama-3"));
    }

    #[tokio::test]
    async fn test_explicit_provider_without_model() {
        let registry = two_provider_registry();
        let err = registry
            .generate(request("gpt-4o"), Some(ProviderKind::DeepSeek))
            .await
            .unwrap_err();
        match err {
            DomainError::ModelNotAvailable { available, .. } => {
                assert_eq!(available, vec!["deepseek-chat", "deepseek-coder"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_explicit_provider_not_registered() {
        let registry = two_provider_registry();
        let err = registry
            .generate(request("moonshot-v1-8k"), Some(ProviderKind::Kimi))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ProviderNotFound { .. }));
    }

    #[test]
    fn test_status_reports_every_kind() {
        let status = two_provider_registry().status();
        assert_eq!(status.len(), 3);
        assert!(status[0].available);
        assert_eq!(status[0].model_count, 4);
        assert!(!status[2].available);
        assert_eq!(status[2].reason.as_deref(), Some("API key not configured"));
    }

    #[test]
    fn test_available_models_filter() {
        let registry = two_provider_registry();
        assert_eq!(registry.available_models(None).len(), 6);
        assert_eq!(registry.available_models(Some(ProviderKind::DeepSeek)).len(), 2);
    }

    #[test]
    fn test_from_config_without_keys_is_empty() {
        temp_env::with_vars_unset(
            ["OPENAI_API_KEY", "DEEPSEEK_API_KEY", "KIMI_API_KEY", "MOONSHOT_API_KEY"],
            || {
                let registry = ProviderRegistry::from_config(&LlmConfig::default()).unwrap();
                assert!(registry.is_empty());
            },
        );
    }
}
