//! Background Epic → Stories → Merge pipeline.
//!
//! A job generates epics with one template, fans out one story call per
//! parsed epic, then merges everything into a markdown development plan.
//! Intermediate results are written as JSON next to the final plan.

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Epic, EpicsArtifact, ExecutionContext, LlmSettings, PhaseStatus, PipelineConfig, PipelineJob,
    PipelinePhase, PipelineStatus, StoriesArtifact,
};
use crate::services::agent_executor::AgentExecutor;
use crate::services::development_plan::render_development_plan;
use crate::services::output_parsers::parse_epics;

/// Runs development-plan pipelines and tracks their state.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    executor: Arc<AgentExecutor>,
    config: PipelineConfig,
    jobs: Arc<RwLock<HashMap<String, PipelineJob>>>,
}

impl PipelineOrchestrator {
    pub fn new(executor: Arc<AgentExecutor>, config: PipelineConfig) -> Self {
        Self {
            executor,
            config,
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Register a job and run it on a spawned task. Returns immediately.
    #[instrument(skip(self, user_input, context, settings))]
    pub async fn start_pipeline(
        &self,
        session_id: &str,
        user_input: &str,
        context: ExecutionContext,
        settings: LlmSettings,
    ) -> DomainResult<String> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let pipeline_id = new_pipeline_id(session_id);
        let job = PipelineJob::new(&pipeline_id, session_id, user_input);
        self.jobs.write().await.insert(pipeline_id.clone(), job);
        tracing::info!(%pipeline_id, "pipeline started");

        let this = self.clone();
        let id = pipeline_id.clone();
        let input = user_input.to_string();
        tokio::spawn(async move {
            this.run(&id, &input, &context, &settings).await;
        });

        Ok(pipeline_id)
    }

    /// Snapshot of a job.
    pub async fn pipeline_status(&self, pipeline_id: &str) -> Option<PipelineJob> {
        self.jobs.read().await.get(pipeline_id).cloned()
    }

    /// Path of the final plan, only once the job has completed.
    pub async fn download_file(&self, pipeline_id: &str) -> Option<PathBuf> {
        self.jobs
            .read()
            .await
            .get(pipeline_id)
            .filter(|job| job.status == PipelineStatus::Completed)
            .and_then(|job| job.final_file.clone())
    }

    /// All jobs, oldest first.
    pub async fn list_pipelines(&self) -> Vec<PipelineJob> {
        let mut jobs: Vec<PipelineJob> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.pipeline_id.cmp(&b.pipeline_id))
        });
        jobs
    }

    /// Poll until the job reaches `completed` or `failed`.
    pub async fn wait_for_completion(
        &self,
        pipeline_id: &str,
        poll_interval: Duration,
    ) -> DomainResult<PipelineJob> {
        loop {
            let job = self
                .pipeline_status(pipeline_id)
                .await
                .ok_or_else(|| DomainError::PipelineNotFound(pipeline_id.to_string()))?;
            if job.status.is_terminal() {
                return Ok(job);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    async fn run(
        &self,
        pipeline_id: &str,
        user_input: &str,
        context: &ExecutionContext,
        settings: &LlmSettings,
    ) {
        if let Err(e) = self.execute(pipeline_id, user_input, context, settings).await {
            tracing::error!(%pipeline_id, error = %e, "pipeline failed");
            let mut jobs = self.jobs.write().await;
            if let Some(job) = jobs.get_mut(pipeline_id) {
                if job.status.can_transition_to(PipelineStatus::Failed) {
                    job.status = PipelineStatus::Failed;
                }
                job.error = Some(e.to_string());
            }
        }
    }

    async fn execute(
        &self,
        pipeline_id: &str,
        user_input: &str,
        context: &ExecutionContext,
        settings: &LlmSettings,
    ) -> DomainResult<()> {
        // Epics
        self.transition(pipeline_id, PipelineStatus::GeneratingEpics, PipelinePhase::Epics)
            .await?;
        let epics_artifact = self.generate_epics(user_input, context, settings).await?;
        let epics_file = self.artifact_path(pipeline_id, "epics.json");
        write_json(&epics_file, &epics_artifact).await?;
        self.update(pipeline_id, |job| {
            job.epics_file = Some(epics_file.clone());
            job.progress.advance(PipelinePhase::Epics, PhaseStatus::Completed);
        })
        .await?;

        let epics = parse_epics(&epics_artifact.content);
        if epics.is_empty() {
            return Err(step_error(PipelinePhase::Epics, "No epics found in result"));
        }
        tracing::info!(%pipeline_id, epics = epics.len(), "epics parsed");

        // Stories
        self.transition(pipeline_id, PipelineStatus::GeneratingStories, PipelinePhase::Stories)
            .await?;
        let story_runs = epics
            .iter()
            .map(|epic| self.generate_stories(pipeline_id, epic, user_input, context, settings));
        let stories_files = join_all(story_runs)
            .await
            .into_iter()
            .collect::<DomainResult<Vec<PathBuf>>>()?;
        self.update(pipeline_id, |job| {
            job.stories_files = stories_files.clone();
            job.progress.advance(PipelinePhase::Stories, PhaseStatus::Completed);
        })
        .await?;

        // Merge
        self.transition(pipeline_id, PipelineStatus::Merging, PipelinePhase::Merge)
            .await?;
        let final_file = self
            .merge(pipeline_id, &epics_artifact, &stories_files)
            .await?;
        tracing::info!(%pipeline_id, path = %final_file.display(), "development plan ready");

        self.update(pipeline_id, |job| {
            job.final_file = Some(final_file.clone());
            job.progress.advance(PipelinePhase::Merge, PhaseStatus::Completed);
            job.completed_at = Some(Utc::now());
        })
        .await?;
        self.set_status(pipeline_id, PipelineStatus::Completed).await
    }

    async fn generate_epics(
        &self,
        user_input: &str,
        context: &ExecutionContext,
        settings: &LlmSettings,
    ) -> DomainResult<EpicsArtifact> {
        let result = self
            .executor
            .execute_template(&self.config.epics_template_id, user_input, context, settings)
            .await
            .map_err(|e| step_error(PipelinePhase::Epics, e))?;

        if let Some(error) = &result.error {
            return Err(step_error(
                PipelinePhase::Epics,
                format!("Failed to generate epics: {error}"),
            ));
        }
        if result.content.trim().is_empty() {
            return Err(step_error(PipelinePhase::Epics, "Epic generator returned no content"));
        }

        Ok(EpicsArtifact {
            agent_name: result.agent_name,
            content: result.content,
            execution_time: result.execution_time,
            confidence_level: result.confidence_level,
            created_at: Utc::now(),
        })
    }

    async fn generate_stories(
        &self,
        pipeline_id: &str,
        epic: &Epic,
        user_input: &str,
        context: &ExecutionContext,
        settings: &LlmSettings,
    ) -> DomainResult<PathBuf> {
        let epic_context = context
            .clone()
            .with_extension(
                "current_epic",
                json!({ "title": epic.title, "content": epic.content }),
            )
            .with_extension("epic_number", json!(epic.number));

        let result = self
            .executor
            .execute_template(
                &self.config.stories_template_id,
                &story_prompt(epic, user_input),
                &epic_context,
                settings,
            )
            .await
            .map_err(|e| step_error(PipelinePhase::Stories, e))?;

        if let Some(error) = &result.error {
            return Err(step_error(
                PipelinePhase::Stories,
                format!("Epic {} stories failed: {error}", epic.number),
            ));
        }

        let artifact = StoriesArtifact {
            epic_number: epic.number,
            epic_title: epic.title.clone(),
            stories_content: result.content,
            execution_time: result.execution_time,
            created_at: Utc::now(),
        };
        let path = self.artifact_path(pipeline_id, &format!("stories_epic_{}.json", epic.number));
        write_json(&path, &artifact).await?;
        tracing::debug!(%pipeline_id, epic = epic.number, "stories saved");
        Ok(path)
    }

    async fn merge(
        &self,
        pipeline_id: &str,
        epics: &EpicsArtifact,
        stories_files: &[PathBuf],
    ) -> DomainResult<PathBuf> {
        let mut stories = Vec::with_capacity(stories_files.len());
        for path in stories_files {
            let raw = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| step_error(PipelinePhase::Merge, format!("{}: {e}", path.display())))?;
            stories.push(serde_json::from_str::<StoriesArtifact>(&raw)?);
        }

        let markdown = render_development_plan(pipeline_id, epics, &stories, Utc::now());
        let final_file = self.artifact_path(pipeline_id, "development_plan.md");
        tokio::fs::write(&final_file, markdown).await?;
        Ok(final_file)
    }

    fn artifact_path(&self, pipeline_id: &str, suffix: &str) -> PathBuf {
        self.config.output_dir.join(format!("{pipeline_id}_{suffix}"))
    }

    async fn update(
        &self,
        pipeline_id: &str,
        apply: impl FnOnce(&mut PipelineJob),
    ) -> DomainResult<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(pipeline_id)
            .ok_or_else(|| DomainError::PipelineNotFound(pipeline_id.to_string()))?;
        apply(job);
        Ok(())
    }

    async fn set_status(&self, pipeline_id: &str, next: PipelineStatus) -> DomainResult<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(pipeline_id)
            .ok_or_else(|| DomainError::PipelineNotFound(pipeline_id.to_string()))?;
        if !job.status.can_transition_to(next) {
            return Err(DomainError::ValidationFailed(format!(
                "Illegal pipeline transition {} -> {next}",
                job.status
            )));
        }
        tracing::info!(%pipeline_id, from = %job.status, to = %next, "pipeline status changed");
        job.status = next;
        Ok(())
    }

    /// Move to `next` and mark `phase` as running.
    async fn transition(
        &self,
        pipeline_id: &str,
        next: PipelineStatus,
        phase: PipelinePhase,
    ) -> DomainResult<()> {
        self.set_status(pipeline_id, next).await?;
        self.update(pipeline_id, |job| job.progress.advance(phase, PhaseStatus::Running))
            .await
    }
}

fn new_pipeline_id(session_id: &str) -> String {
    let short = Uuid::new_v4().simple().to_string();
    format!(
        "pipeline_{session_id}_{}_{}",
        Utc::now().timestamp(),
        &short[..8]
    )
}

fn story_prompt(epic: &Epic, user_input: &str) -> String {
    format!(
        "Based on the following epic, generate detailed user stories:

EPIC {}: {}
{}

Original user request: {user_input}

Generate 3-4 user stories for this epic. Each story should have:
- Story title
- User story format: \"As a [user], I want [goal] so that [benefit]\"
- Acceptance criteria
- Priority and effort estimate",
        epic.number, epic.title, epic.content
    )
}

fn step_error(phase: PipelinePhase, message: impl ToString) -> DomainError {
    DomainError::PipelineStep {
        step: phase.as_str().to_string(),
        message: message.to_string(),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> DomainResult<()> {
    let body = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}
