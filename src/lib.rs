//! Conclave - multi-agent LLM orchestration
//!
//! Conclave runs configurable "agent templates" (persona prompts) against
//! OpenAI-compatible chat providers. Templates may depend on each other; a
//! batch is executed in dependency stages so that downstream agents see
//! upstream output. On top of the executor sit a keyword-based handoff
//! coordinator and a background Epic → Stories → Merge pipeline that
//! produces a markdown development plan.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the provider port
//! - **Adapters** (`adapters`): the HTTP provider and a scripted mock
//! - **Service Layer** (`services`): registry, template store, executor,
//!   coordinator and pipeline
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use conclave::{AgentExecutor, ExecutionContext, LlmSettings, ProviderRegistry, TemplateStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = conclave::ConfigLoader::load()?;
//!     let registry = Arc::new(ProviderRegistry::from_config(&config.llm)?);
//!     let store = Arc::new(TemplateStore::in_memory());
//!     let executor = AgentExecutor::new(store, registry);
//!     let ids = vec!["developer_default".to_string(), "critique_default".to_string()];
//!     let results = executor
//!         .execute_templates(&ids, "Build a todo app", &ExecutionContext::new(), &LlmSettings::default())
//!         .await?;
//!     println!("{}", results[0].content);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AgentRole, AgentTemplate, AgentTemplateType, Config, ExecutionContext, ExecutionResult,
    LlmSettings, PipelineJob, PipelineStatus, ProviderKind,
};
pub use domain::ports::LlmProvider;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AgentExecutor, DependencyResolver, HandoffCoordinator, PipelineOrchestrator, ProviderRegistry,
    TemplateStore,
};
