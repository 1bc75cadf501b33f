//! Dependency-ordered agent executor.
//!
//! Runs a batch of templates in dependency stages. All agents of a stage
//! are awaited together and the stage settles before the next one starts.
//! Each agent sees the full results of its already-executed dependencies
//! in its prompt. A failed LLM call never aborts the batch: it becomes a
//! degraded result that dependants still receive.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AgentTemplate, AgentTemplateType, ChatMessage, ExecutionContext, ExecutionResult,
    ExecutorConfig, GenerationRequest, LlmConfig, LlmSettings,
};
use crate::services::dependency_resolver::{DependencyNode, DependencyResolver};
use crate::services::output_parsers::{self, VARIATION_COUNT};
use crate::services::provider_registry::ProviderRegistry;
use crate::services::template_store::TemplateStore;

const QUESTIONS_INSTRUCTION: &str =
    "Generate exactly 10 strategic questions that would help better understand and improve this request.";

/// Confidence reported for a variation agent with at least one answer.
const VARIATION_CONFIDENCE: f64 = 0.9;
const QUESTIONS_CONFIDENCE: f64 = 0.85;
/// Temperature step between consecutive variations.
const VARIATION_TEMPERATURE_STEP: f32 = 0.1;

/// Event emitted during batch execution.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum ExecutionEvent {
    /// Batch validated and ordered.
    Started { total_agents: usize, stage_count: usize },
    /// Stage started.
    StageStarted { stage_number: usize, template_ids: Vec<String> },
    /// One agent finished, possibly degraded.
    AgentCompleted { stage_number: usize, result: ExecutionResult },
    /// Stage settled.
    StageCompleted { stage_number: usize, succeeded: usize, degraded: usize },
    /// Batch finished.
    Completed { total_agents: usize, degraded: usize, duration_secs: f64 },
}

/// Model, temperature and token limit for one call.
#[derive(Debug, Clone, PartialEq)]
struct CallParams {
    model: String,
    temperature: f32,
    max_tokens: u32,
}

/// Executes agent templates against the provider registry.
pub struct AgentExecutor {
    store: Arc<TemplateStore>,
    registry: Arc<ProviderRegistry>,
    resolver: DependencyResolver,
    llm: LlmConfig,
    config: ExecutorConfig,
}

impl AgentExecutor {
    pub fn new(store: Arc<TemplateStore>, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            store,
            registry,
            resolver: DependencyResolver::new(),
            llm: LlmConfig::default(),
            config: ExecutorConfig::default(),
        }
    }

    pub fn with_config(mut self, llm: LlmConfig, config: ExecutorConfig) -> Self {
        self.llm = llm;
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<TemplateStore> {
        &self.store
    }

    /// Run a single template, ignoring its dependencies.
    pub async fn execute_template(
        &self,
        template_id: &str,
        user_input: &str,
        context: &ExecutionContext,
        settings: &LlmSettings,
    ) -> DomainResult<ExecutionResult> {
        let template = self
            .store
            .get(template_id)
            .await
            .ok_or_else(|| DomainError::TemplateNotFound(template_id.to_string()))?;
        Ok(self.run_template(&template, user_input, context, settings).await)
    }

    /// Run several templates in dependency order.
    ///
    /// Returns one result per id in the requested order. Unknown ids,
    /// duplicate ids and dependency cycles fail before any LLM call.
    pub async fn execute_templates(
        &self,
        template_ids: &[String],
        user_input: &str,
        context: &ExecutionContext,
        settings: &LlmSettings,
    ) -> DomainResult<Vec<ExecutionResult>> {
        self.execute_batch(template_ids, user_input, context, settings, None)
            .await
    }

    /// Like [`Self::execute_templates`], also reporting progress on `event_tx`.
    pub async fn execute_templates_with_events(
        &self,
        template_ids: &[String],
        user_input: &str,
        context: &ExecutionContext,
        settings: &LlmSettings,
        event_tx: mpsc::Sender<ExecutionEvent>,
    ) -> DomainResult<Vec<ExecutionResult>> {
        self.execute_batch(template_ids, user_input, context, settings, Some(&event_tx))
            .await
    }

    #[instrument(skip_all, fields(agents = template_ids.len()))]
    async fn execute_batch(
        &self,
        template_ids: &[String],
        user_input: &str,
        context: &ExecutionContext,
        settings: &LlmSettings,
        event_tx: Option<&mpsc::Sender<ExecutionEvent>>,
    ) -> DomainResult<Vec<ExecutionResult>> {
        let started = Instant::now();
        let templates = self.store.get_many(template_ids).await?;
        let nodes: Vec<DependencyNode> = templates.iter().map(DependencyNode::from).collect();
        let stages = self.resolver.execution_stages(&nodes)?;

        let by_id: HashMap<&str, &AgentTemplate> =
            templates.iter().map(|t| (t.id.as_str(), t)).collect();

        tracing::info!(
            agents = templates.len(),
            stages = stages.len(),
            "executing agent templates"
        );
        emit(
            event_tx,
            ExecutionEvent::Started {
                total_agents: templates.len(),
                stage_count: stages.len(),
            },
        )
        .await;

        let mut executed: HashMap<String, ExecutionResult> = HashMap::with_capacity(templates.len());

        for (stage_number, stage) in stages.iter().enumerate() {
            tracing::info!(stage = stage_number, agents = ?stage, "stage started");
            emit(
                event_tx,
                ExecutionEvent::StageStarted {
                    stage_number,
                    template_ids: stage.clone(),
                },
            )
            .await;

            let runs = stage.iter().filter_map(|id| by_id.get(id.as_str())).map(|template| {
                let upstream: Vec<ExecutionResult> = template
                    .depends_on
                    .iter()
                    .filter_map(|dep| executed.get(dep).cloned())
                    .collect();
                let agent_context = if upstream.is_empty() {
                    context.clone()
                } else {
                    context.with_dependency_results(upstream)
                };
                async move {
                    self.run_template(template, user_input, &agent_context, settings)
                        .await
                }
            });
            let stage_results = join_all(runs).await;

            let degraded = stage_results.iter().filter(|r| r.is_degraded()).count();
            for result in stage_results {
                emit(
                    event_tx,
                    ExecutionEvent::AgentCompleted {
                        stage_number,
                        result: result.clone(),
                    },
                )
                .await;
                executed.insert(result.template_id.clone(), result);
            }

            tracing::info!(stage = stage_number, degraded, "stage completed");
            emit(
                event_tx,
                ExecutionEvent::StageCompleted {
                    stage_number,
                    succeeded: stage.len() - degraded,
                    degraded,
                },
            )
            .await;
        }

        let results: Vec<ExecutionResult> = template_ids
            .iter()
            .filter_map(|id| executed.remove(id))
            .collect();

        let degraded = results.iter().filter(|r| r.is_degraded()).count();
        emit(
            event_tx,
            ExecutionEvent::Completed {
                total_agents: results.len(),
                degraded,
                duration_secs: started.elapsed().as_secs_f64(),
            },
        )
        .await;

        Ok(results)
    }

    /// Run one template. Never fails; LLM errors become degraded results.
    async fn run_template(
        &self,
        template: &AgentTemplate,
        user_input: &str,
        context: &ExecutionContext,
        settings: &LlmSettings,
    ) -> ExecutionResult {
        let rendered = context.render();
        tracing::debug!(
            template_id = %template.id,
            dependencies = context.dependency_results.len(),
            context_chars = rendered.len(),
            "running agent"
        );

        let result = match template.template_type {
            AgentTemplateType::Rerun => {
                self.run_variations(template, user_input, &rendered, settings)
                    .await
            }
            AgentTemplateType::Questions => {
                self.run_questions(template, user_input, &rendered, settings)
                    .await
            }
            _ => {
                self.run_standard(template, user_input, &rendered, settings)
                    .await
            }
        };

        if let Some(error) = &result.error {
            tracing::warn!(template_id = %template.id, %error, "agent returned degraded result");
        }
        result
    }

    fn params(&self, settings: &LlmSettings, temperature: f32, max_tokens: u32) -> CallParams {
        CallParams {
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| self.llm.default_model.clone()),
            temperature: settings.temperature.unwrap_or(temperature),
            max_tokens: settings.max_tokens.unwrap_or(max_tokens),
        }
    }

    async fn call(&self, params: &CallParams, messages: Vec<ChatMessage>) -> DomainResult<String> {
        let request = GenerationRequest::new(&params.model, messages)
            .with_temperature(params.temperature)
            .with_max_tokens(params.max_tokens);
        Ok(self.registry.generate(request, None).await?.content)
    }

    async fn run_standard(
        &self,
        template: &AgentTemplate,
        user_input: &str,
        rendered_context: &str,
        settings: &LlmSettings,
    ) -> ExecutionResult {
        let started = Instant::now();
        let params = self.params(
            settings,
            self.llm.default_temperature,
            self.config.standard_max_tokens,
        );
        let prompt = format!(
            "{}\n\nPlease provide your analysis and recommendations based on your role as {}.",
            base_prompt(template, rendered_context, user_input),
            template.name
        );

        match self
            .call(
                &params,
                vec![ChatMessage::system(&template.prompt), ChatMessage::user(prompt)],
            )
            .await
        {
            Ok(content) => {
                let mut result = ExecutionResult::new(&template.id, &template.name, content);
                result.suggestions = output_parsers::extract_suggestions(&result.content);
                result.confidence_level = output_parsers::confidence_from_length(&result.content);
                match template.template_type {
                    AgentTemplateType::Critique => {
                        result.critique = output_parsers::extract_critique(&result.content);
                    }
                    AgentTemplateType::Coach => {
                        result.alternative_ideas =
                            output_parsers::extract_alternative_ideas(&result.content);
                    }
                    AgentTemplateType::CompanyCompetitor => {
                        result.competitor_analysis =
                            output_parsers::extract_competitor_analysis(&result.content);
                    }
                    _ => {}
                }
                result.execution_time = started.elapsed().as_secs_f64();
                result
            }
            Err(e) => ExecutionResult::degraded(
                &template.id,
                &template.name,
                e.to_string(),
                started.elapsed().as_secs_f64(),
            ),
        }
    }

    async fn run_variations(
        &self,
        template: &AgentTemplate,
        user_input: &str,
        rendered_context: &str,
        settings: &LlmSettings,
    ) -> ExecutionResult {
        let started = Instant::now();
        let base = self.params(
            settings,
            self.config.variation_base_temperature,
            self.config.variation_max_tokens,
        );
        let prompt = base_prompt(template, rendered_context, user_input);

        let calls = (0..VARIATION_COUNT).map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let params = CallParams {
                temperature: base.temperature + VARIATION_TEMPERATURE_STEP * i as f32,
                ..base.clone()
            };
            let variation = format!(
                "{prompt}\n\nThis is variation #{}. Provide a unique perspective focusing on different aspects or approaches than the other variations.",
                i + 1
            );
            async move { self.call(&params, vec![ChatMessage::user(variation)]).await }
        });
        let responses = join_all(calls).await;

        let failures = responses.iter().filter(|r| r.is_err()).count();
        let rerun_results: Vec<String> = responses
            .into_iter()
            .enumerate()
            .map(|(i, response)| {
                let text = response.unwrap_or_else(|e| format!("Error getting response: {e}"));
                format!("Analysis #{}:\n{text}", i + 1)
            })
            .collect();

        let separator = format!("\n\n{}\n\n", "=".repeat(50));
        let mut result =
            ExecutionResult::new(&template.id, &template.name, rerun_results.join(&separator));
        result.rerun_results = rerun_results;
        if failures == VARIATION_COUNT {
            result.error = Some("every variation call failed".to_string());
        } else {
            result.confidence_level = VARIATION_CONFIDENCE;
        }
        result.execution_time = started.elapsed().as_secs_f64();
        result
    }

    async fn run_questions(
        &self,
        template: &AgentTemplate,
        user_input: &str,
        rendered_context: &str,
        settings: &LlmSettings,
    ) -> ExecutionResult {
        let started = Instant::now();
        let params = self.params(
            settings,
            self.config.question_temperature,
            self.config.question_max_tokens,
        );
        let prompt = format!(
            "{}\n\n{QUESTIONS_INSTRUCTION}",
            base_prompt(template, rendered_context, user_input)
        );

        match self
            .call(
                &params,
                vec![ChatMessage::system(&template.prompt), ChatMessage::user(prompt)],
            )
            .await
        {
            Ok(content) => {
                let mut result = ExecutionResult::new(&template.id, &template.name, content);
                result.questions = output_parsers::extract_questions(&result.content);
                result.confidence_level = QUESTIONS_CONFIDENCE;
                result.execution_time = started.elapsed().as_secs_f64();
                result
            }
            Err(e) => ExecutionResult::degraded(
                &template.id,
                &template.name,
                e.to_string(),
                started.elapsed().as_secs_f64(),
            ),
        }
    }
}

/// Persona prompt, context block and user request.
fn base_prompt(template: &AgentTemplate, rendered_context: &str, user_input: &str) -> String {
    format!(
        "{}\n\nCONTEXT:\n{rendered_context}\n\nUSER REQUEST:\n{user_input}",
        template.prompt
    )
}

async fn emit(event_tx: Option<&mpsc::Sender<ExecutionEvent>>, event: ExecutionEvent) {
    if let Some(tx) = event_tx {
        let _ = tx.send(event).await;
    }
}
