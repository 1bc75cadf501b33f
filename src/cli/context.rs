//! Wiring shared by the CLI commands.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{AgentExecutor, PipelineOrchestrator, ProviderRegistry, TemplateStore};

/// Loaded configuration plus the long-lived services built from it.
pub struct AppContext {
    pub config: Config,
    pub registry: Arc<ProviderRegistry>,
    pub store: Arc<TemplateStore>,
}

impl AppContext {
    pub fn load_config(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(),
        }
    }

    pub async fn build(config: Config) -> Result<Self> {
        let registry = ProviderRegistry::from_config(&config.llm)
            .context("Failed to initialize LLM providers")?;

        let store = match &config.templates.path {
            Some(path) => TemplateStore::load(path)
                .await
                .with_context(|| format!("Failed to load templates from {}", path.display()))?,
            None => TemplateStore::in_memory(),
        };

        Ok(Self {
            config,
            registry: Arc::new(registry),
            store: Arc::new(store),
        })
    }

    pub fn executor(&self) -> Arc<AgentExecutor> {
        Arc::new(
            AgentExecutor::new(self.store.clone(), self.registry.clone())
                .with_config(self.config.llm.clone(), self.config.executor.clone()),
        )
    }

    pub fn orchestrator(&self) -> PipelineOrchestrator {
        PipelineOrchestrator::new(self.executor(), self.config.pipeline.clone())
    }
}
