//! Static model catalogs for the OpenAI-compatible backends.

use crate::domain::models::{ModelInfo, ProviderKind};

/// `(id, display name, context length, cost per token, description)`
type CatalogEntry = (&'static str, &'static str, u32, f64, &'static str);

const OPENAI_MODELS: &[CatalogEntry] = &[
    ("gpt-4o", "GPT-4o", 128_000, 0.000_01, "Most capable multimodal model"),
    ("gpt-4o-mini", "GPT-4o Mini", 128_000, 0.000_001, "Fast and affordable small model"),
    ("gpt-4-turbo", "GPT-4 Turbo", 128_000, 0.000_01, "High-capability GPT-4 with large context"),
    ("gpt-3.5-turbo", "GPT-3.5 Turbo", 16_385, 0.000_001, "Fast model for simple tasks"),
];

const DEEPSEEK_MODELS: &[CatalogEntry] = &[
    ("deepseek-chat", "DeepSeek Chat", 32_768, 0.000_001, "General-purpose conversational model"),
    ("deepseek-coder", "DeepSeek Coder", 16_384, 0.000_001, "Code generation and analysis"),
];

const KIMI_MODELS: &[CatalogEntry] = &[
    ("moonshot-v1-8k", "Kimi 8K", 8_192, 0.000_005, "Moonshot model with 8K context"),
    ("moonshot-v1-32k", "Kimi 32K", 32_768, 0.000_01, "Moonshot model with 32K context"),
    ("moonshot-v1-128k", "Kimi 128K", 131_072, 0.000_05, "Moonshot model with 128K context"),
];

/// Catalog for a provider kind. Every listed model supports streaming.
pub fn models_for(kind: ProviderKind) -> Vec<ModelInfo> {
    let entries = match kind {
        ProviderKind::OpenAi => OPENAI_MODELS,
        ProviderKind::DeepSeek => DEEPSEEK_MODELS,
        ProviderKind::Kimi => KIMI_MODELS,
    };

    entries
        .iter()
        .map(|&(id, name, context_length, cost_per_token, description)| ModelInfo {
            id: id.to_string(),
            name: name.to_string(),
            provider: kind,
            context_length,
            supports_streaming: true,
            cost_per_token,
            description: description.to_string(),
        })
        .collect()
}
