//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces implemented by adapters:
//! - LlmProvider: chat-completion backends

pub mod llm_provider;

pub use llm_provider::LlmProvider;
