//! Application services: orchestration logic on top of the domain ports.

pub mod agent_executor;
pub mod dependency_resolver;
pub mod development_plan;
pub mod handoff_coordinator;
pub mod output_parsers;
pub mod pipeline_orchestrator;
pub mod provider_registry;
pub mod template_store;

pub use agent_executor::{AgentExecutor, ExecutionEvent};
pub use dependency_resolver::{DependencyNode, DependencyResolver};
pub use development_plan::render_development_plan;
pub use handoff_coordinator::HandoffCoordinator;
pub use pipeline_orchestrator::PipelineOrchestrator;
pub use provider_registry::ProviderRegistry;
pub use template_store::TemplateStore;
