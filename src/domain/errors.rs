//! Domain errors for the Conclave orchestration system.

use thiserror::Error;

/// Format a list of template ids as `a, b, c`.
fn format_id_list(ids: &[String]) -> String {
    ids.join(", ")
}

/// Domain-level errors that can occur in Conclave.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Circular dependency detected among templates: {}", format_id_list(.0))]
    CircularDependency(Vec<String>),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("No provider found for model: {model}")]
    ProviderNotFound { model: String },

    #[error("Model {model} not available in {provider}. Available models: {}", format_id_list(.available))]
    ModelNotAvailable {
        model: String,
        provider: String,
        available: Vec<String>,
    },

    #[error("{provider} API error for {model}: {message}")]
    ProviderCall {
        provider: String,
        model: String,
        message: String,
    },

    #[error("Pipeline step '{step}' failed: {message}")]
    PipelineStep { step: String, message: String },

    #[error("Pipeline not found: {0}")]
    PipelineNotFound(String),

    #[error("Cannot delete built-in template: {0}")]
    BuiltinTemplate(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::StorageError(err.to_string())
    }
}
