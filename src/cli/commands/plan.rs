//! Development plan pipeline command.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::cli::progress;
use crate::domain::models::{ExecutionContext, LlmSettings, PipelineStatus};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// The product request to plan
    #[arg(short, long)]
    pub input: String,

    /// Session id embedded in the pipeline id
    #[arg(short, long, default_value = "cli")]
    pub session: String,

    /// Model to use instead of the configured default
    #[arg(short, long)]
    pub model: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct PlanOutput {
    pub pipeline_id: String,
    pub status: PipelineStatus,
    pub final_file: Option<PathBuf>,
    pub stories_files: Vec<PathBuf>,
}

impl CommandOutput for PlanOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Pipeline: {}", self.pipeline_id),
            format!("Status: {}", self.status),
            format!("Epics with stories: {}", self.stories_files.len()),
        ];
        if let Some(path) = &self.final_file {
            lines.push(format!("Development plan: {}", path.display()));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: PlanArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let orchestrator = ctx.orchestrator();
    let settings = LlmSettings {
        model: args.model,
        ..LlmSettings::default()
    };

    let pipeline_id = orchestrator
        .start_pipeline(&args.session, &args.input, ExecutionContext::new(), settings)
        .await?;
    let spinner = progress::spinner(format!("Running pipeline {pipeline_id}"), json_mode);
    let job = orchestrator
        .wait_for_completion(&pipeline_id, POLL_INTERVAL)
        .await;
    spinner.finish_and_clear();
    let job = job?;

    if job.status == PipelineStatus::Failed {
        bail!(
            "Pipeline {pipeline_id} failed: {}",
            job.error.as_deref().unwrap_or("unknown error")
        );
    }

    let out = PlanOutput {
        final_file: orchestrator.download_file(&pipeline_id).await,
        pipeline_id,
        status: job.status,
        stories_files: job.stories_files,
    };
    output(&out, json_mode);
    Ok(())
}
