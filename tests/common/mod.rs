//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;

use conclave::adapters::providers::MockProvider;
use conclave::domain::models::{AgentTemplate, AgentTemplateType};
use conclave::services::{AgentExecutor, ProviderRegistry, TemplateStore};

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A custom developer-type template with the given prompt and dependencies.
pub fn template(id: &str, prompt: &str, deps: &[&str]) -> AgentTemplate {
    AgentTemplate::new(id, id.replace('_', " "), AgentTemplateType::Developer)
        .with_prompt(prompt)
        .with_dependencies(deps.iter().copied())
        .custom()
}

/// Executor over the built-ins plus `templates`, backed by `mock`.
pub fn executor_with(mock: Arc<MockProvider>, templates: Vec<AgentTemplate>) -> AgentExecutor {
    let registry = ProviderRegistry::new().with_provider(mock);
    let store = TemplateStore::with_templates(templates);
    AgentExecutor::new(Arc::new(store), Arc::new(registry))
}
