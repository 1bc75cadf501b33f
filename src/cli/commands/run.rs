//! Run one or more templates against a request.

use anyhow::Result;
use clap::Args;
use indicatif::ProgressBar;
use tokio::sync::mpsc;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::cli::progress;
use crate::domain::errors::DomainResult;
use crate::domain::models::{ExecutionContext, ExecutionResult, LlmSettings};
use crate::services::{AgentExecutor, ExecutionEvent};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Template id; repeat to run several in dependency order
    #[arg(short, long = "template", required = true)]
    pub templates: Vec<String>,

    /// The user request
    #[arg(short, long)]
    pub input: String,

    /// Model to use instead of the configured default
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature override
    #[arg(long)]
    pub temperature: Option<f32>,
}

#[derive(Debug, serde::Serialize)]
pub struct RunOutput {
    pub results: Vec<ExecutionResult>,
    pub degraded: usize,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for result in &self.results {
            lines.push(format!("=== {} ({}) ===", result.agent_name, result.template_id));
            lines.push(format!(
                "confidence {:.2} | {:.2}s{}",
                result.confidence_level,
                result.execution_time,
                if result.is_degraded() { " | DEGRADED" } else { "" }
            ));
            lines.push(String::new());
            lines.push(result.content.clone());
            if !result.questions.is_empty() {
                lines.push("\nQuestions:".to_string());
                lines.extend(result.questions.iter().map(|q| format!("  - {q}")));
            }
            lines.push(String::new());
        }
        if self.degraded > 0 {
            lines.push(format!("{} agent(s) returned degraded results", self.degraded));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: RunArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let executor = ctx.executor();
    let settings = LlmSettings {
        model: args.model.clone(),
        temperature: args.temperature,
        max_tokens: None,
    };
    let bar = progress::agent_bar(args.templates.len() as u64, json_mode);

    let results = run_with_progress(&executor, &args, &settings, bar).await?;

    let out = RunOutput {
        degraded: results.iter().filter(|r| r.is_degraded()).count(),
        results,
    };
    output(&out, json_mode);
    Ok(())
}

/// Execute the batch while `bar` tracks finished agents. The bar is cleared
/// whether or not the batch succeeds.
async fn run_with_progress(
    executor: &AgentExecutor,
    args: &RunArgs,
    settings: &LlmSettings,
    bar: ProgressBar,
) -> DomainResult<Vec<ExecutionResult>> {
    let (tx, mut rx) = mpsc::channel(64);
    let progress_bar = bar.clone();
    let listener = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ExecutionEvent::StageStarted { stage_number, template_ids } => {
                    tracing::info!(stage = stage_number, templates = ?template_ids, "stage started");
                    progress_bar.set_message(format!(
                        "stage {}: {}",
                        stage_number + 1,
                        template_ids.join(", ")
                    ));
                }
                ExecutionEvent::AgentCompleted { result, .. } => {
                    tracing::info!(
                        template_id = %result.template_id,
                        degraded = result.is_degraded(),
                        "agent finished"
                    );
                    progress_bar.inc(1);
                }
                _ => {}
            }
        }
    });

    let results = executor
        .execute_templates_with_events(
            &args.templates,
            &args.input,
            &ExecutionContext::new(),
            settings,
            tx,
        )
        .await;
    let _ = listener.await;
    bar.finish_and_clear();
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::providers::MockProvider;
    use crate::domain::models::{AgentTemplate, AgentTemplateType};
    use crate::services::{ProviderRegistry, TemplateStore};
    use std::sync::Arc;

    fn executor(templates: Vec<AgentTemplate>) -> AgentExecutor {
        let registry = ProviderRegistry::new().with_provider(Arc::new(MockProvider::new()));
        AgentExecutor::new(
            Arc::new(TemplateStore::with_templates(templates)),
            Arc::new(registry),
        )
    }

    fn template(id: &str, deps: &[&str]) -> AgentTemplate {
        AgentTemplate::new(id, id, AgentTemplateType::Developer)
            .with_prompt("P")
            .with_dependencies(deps.iter().copied())
            .custom()
    }

    fn args(ids: &[&str]) -> RunArgs {
        RunArgs {
            templates: ids.iter().map(ToString::to_string).collect(),
            input: "x".to_string(),
            model: None,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn test_bar_cleared_when_batch_fails() {
        let executor = executor(vec![template("a", &["b"]), template("b", &["a"])]);
        let bar = progress::agent_bar(2, false);

        let result =
            run_with_progress(&executor, &args(&["a", "b"]), &LlmSettings::default(), bar.clone())
                .await;

        assert!(result.is_err());
        assert!(bar.is_finished());
    }

    #[tokio::test]
    async fn test_bar_counts_finished_agents() {
        let executor = executor(vec![template("a", &[]), template("b", &["a"])]);
        let bar = progress::agent_bar(2, false);

        let results =
            run_with_progress(&executor, &args(&["a", "b"]), &LlmSettings::default(), bar.clone())
                .await
                .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(bar.position(), 2);
        assert!(bar.is_finished());
    }
}
