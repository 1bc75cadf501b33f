//! Domain models

pub mod builtin_templates;
pub mod config;
pub mod execution;
pub mod handoff;
pub mod llm;
pub mod pipeline;
pub mod template;

pub use builtin_templates::create_builtin_templates;
pub use config::{
    Config, ExecutorConfig, LlmConfig, LogFormat, LoggingConfig, PipelineConfig,
    ProviderCredentials, RotationPolicy, TemplatesConfig,
};
pub use execution::{
    ExecutionContext, ExecutionResult, LlmSettings, DEPENDENCY_SUGGESTION_LIMIT, HISTORY_WINDOW,
};
pub use handoff::{AgentRole, HandoffDecision, SynthesisSummary, WorkloadAssignment};
pub use llm::{
    ChatMessage, ChatRole, GenerationRequest, LlmResponse, ModelInfo, ModelSummary, ProviderKind,
    ProviderStatus,
};
pub use pipeline::{
    Epic, EpicsArtifact, PhaseStatus, PipelineJob, PipelinePhase, PipelineProgress,
    PipelineStatus, StoriesArtifact,
};
pub use template::{
    AgentTemplate, AgentTemplateType, CreateTemplateRequest, TemplateCollection,
    UpdateTemplateRequest,
};
