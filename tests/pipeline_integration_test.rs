//! Integration tests for the Epic → Stories → Merge pipeline.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use conclave::adapters::providers::{MockProvider, MockResponse};
use conclave::domain::models::{
    ExecutionContext, LlmSettings, PhaseStatus, PipelineConfig, PipelineJob, PipelineStatus,
};
use conclave::services::PipelineOrchestrator;
use tempfile::TempDir;

const EPICS_OUTPUT: &str = "\
Here is the breakdown.

EPIC 1: Accounts
Sign-up, login and password reset.

**EPIC 2: Billing**
Subscriptions and invoices.

EPIC 3: Reports
Usage charts.";

fn story_needle(n: usize) -> String {
    format!("generate detailed user stories:\n\nEPIC {n}:")
}

fn orchestrator(mock: Arc<MockProvider>, dir: &TempDir) -> PipelineOrchestrator {
    let executor = common::executor_with(mock, vec![]);
    let config = PipelineConfig {
        output_dir: dir.path().join("plans"),
        ..PipelineConfig::default()
    };
    PipelineOrchestrator::new(Arc::new(executor), config)
}

async fn run_to_end(orchestrator: &PipelineOrchestrator, input: &str) -> PipelineJob {
    let id = orchestrator
        .start_pipeline("sess1", input, ExecutionContext::new(), LlmSettings::default())
        .await
        .unwrap();
    tokio::time::timeout(
        Duration::from_secs(10),
        orchestrator.wait_for_completion(&id, Duration::from_millis(10)),
    )
    .await
    .expect("pipeline did not finish in time")
    .unwrap()
}

#[tokio::test]
async fn test_happy_path_writes_all_artifacts() {
    common::setup_test_logging();
    let dir = common::temp_dir();
    let mock = Arc::new(
        MockProvider::new().with_default_response(MockResponse::success(EPICS_OUTPUT)),
    );
    // Epic 3 finishes first, epic 1 last.
    mock.respond_when(
        story_needle(1),
        MockResponse::success("Stories for accounts").with_delay(Duration::from_millis(60)),
    )
    .await;
    mock.respond_when(
        story_needle(2),
        MockResponse::success("Stories for billing").with_delay(Duration::from_millis(30)),
    )
    .await;
    mock.respond_when(story_needle(3), MockResponse::success("Stories for reports"))
        .await;

    let orchestrator = orchestrator(mock.clone(), &dir);
    let job = run_to_end(&orchestrator, "Build a SaaS billing product").await;

    assert_eq!(job.status, PipelineStatus::Completed, "error: {:?}", job.error);
    assert!(job.pipeline_id.starts_with("pipeline_sess1_"));
    assert!(job.error.is_none());
    assert!(job.completed_at.is_some());
    assert_eq!(job.progress.epics, PhaseStatus::Completed);
    assert_eq!(job.progress.stories, PhaseStatus::Completed);
    assert_eq!(job.progress.merge, PhaseStatus::Completed);

    assert_eq!(mock.calls_matching("generate detailed user stories").await.len(), 3);

    let epics_file = job.epics_file.clone().unwrap();
    assert!(epics_file.ends_with(format!("{}_epics.json", job.pipeline_id)));
    let epics_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&epics_file).unwrap()).unwrap();
    assert_eq!(epics_json["agent_name"], "Epics Generator");
    assert_eq!(epics_json["content"], EPICS_OUTPUT);

    assert_eq!(job.stories_files.len(), 3);
    let story_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&job.stories_files[1]).unwrap()).unwrap();
    assert_eq!(story_json["epic_number"], 2);
    assert_eq!(story_json["epic_title"], "2 Billing");
    assert_eq!(story_json["stories_content"], "Stories for billing");

    let final_file = orchestrator.download_file(&job.pipeline_id).await.unwrap();
    assert_eq!(Some(&final_file), job.final_file.as_ref());
    let plan = std::fs::read_to_string(&final_file).unwrap();
    let first = plan.find("### Epic 1: 1 Accounts").unwrap();
    let second = plan.find("### Epic 2: 2 Billing").unwrap();
    let third = plan.find("### Epic 3: 3 Reports").unwrap();
    assert!(first < second && second < third);
    assert!(plan.contains("- **Total Epics**: 3"));
    assert!(plan.contains(&format!("- **Pipeline ID**: {}", job.pipeline_id)));
}

#[tokio::test]
async fn test_story_context_carries_epic() {
    let dir = common::temp_dir();
    let mock = Arc::new(
        MockProvider::new().with_default_response(MockResponse::success(EPICS_OUTPUT)),
    );
    let orchestrator = orchestrator(mock.clone(), &dir);
    let job = run_to_end(&orchestrator, "Build a SaaS").await;
    assert_eq!(job.status, PipelineStatus::Completed);

    let calls = mock.calls_matching(&story_needle(2)).await;
    assert_eq!(calls.len(), 1);
    let prompt = calls[0].prompt_text();
    assert!(prompt.contains("Subscriptions and invoices."));
    assert!(prompt.contains("Original user request: Build a SaaS"));
}

#[tokio::test]
async fn test_story_failure_fails_job() {
    let dir = common::temp_dir();
    let mock = Arc::new(
        MockProvider::new().with_default_response(MockResponse::success(EPICS_OUTPUT)),
    );
    mock.respond_when(story_needle(2), MockResponse::failure("upstream 500"))
        .await;

    let orchestrator = orchestrator(mock, &dir);
    let job = run_to_end(&orchestrator, "Build a SaaS").await;

    assert_eq!(job.status, PipelineStatus::Failed);
    assert!(job.error.as_deref().is_some_and(|e| !e.is_empty()));
    assert!(job.final_file.is_none());
    assert!(orchestrator.download_file(&job.pipeline_id).await.is_none());
}

#[tokio::test]
async fn test_unparseable_epics_fail_job() {
    let dir = common::temp_dir();
    let mock = Arc::new(
        MockProvider::new().with_default_response(MockResponse::success("No structure here.")),
    );

    let orchestrator = orchestrator(mock.clone(), &dir);
    let job = run_to_end(&orchestrator, "x").await;

    assert_eq!(job.status, PipelineStatus::Failed);
    assert!(job.error.unwrap().contains("No epics found"));
    assert_eq!(mock.calls_matching("generate detailed user stories").await.len(), 0);
    assert_eq!(job.progress.stories, PhaseStatus::Pending);
}

#[tokio::test]
async fn test_epic_generation_failure_fails_job() {
    let dir = common::temp_dir();
    let mock = Arc::new(MockProvider::new().with_default_response(MockResponse::failure("down")));

    let orchestrator = orchestrator(mock, &dir);
    let job = run_to_end(&orchestrator, "x").await;

    assert_eq!(job.status, PipelineStatus::Failed);
    assert!(job.epics_file.is_none());
    assert!(job.error.unwrap().contains("epics"));
}

#[tokio::test]
async fn test_unknown_pipeline() {
    let dir = common::temp_dir();
    let orchestrator = orchestrator(Arc::new(MockProvider::new()), &dir);

    assert!(orchestrator.pipeline_status("pipeline_nope").await.is_none());
    assert!(orchestrator.download_file("pipeline_nope").await.is_none());
    assert!(orchestrator
        .wait_for_completion("pipeline_nope", Duration::from_millis(1))
        .await
        .is_err());
}

#[tokio::test]
async fn test_list_pipelines() {
    let dir = common::temp_dir();
    let mock = Arc::new(
        MockProvider::new().with_default_response(MockResponse::success(EPICS_OUTPUT)),
    );
    let orchestrator = orchestrator(mock, &dir);

    let first = run_to_end(&orchestrator, "one").await;
    let second = run_to_end(&orchestrator, "two").await;

    let listed = orchestrator.list_pipelines().await;
    assert_eq!(listed.len(), 2);
    let listed_ids: Vec<&str> = listed.iter().map(|j| j.pipeline_id.as_str()).collect();
    assert!(listed_ids.contains(&first.pipeline_id.as_str()));
    assert!(listed_ids.contains(&second.pipeline_id.as_str()));
}

#[tokio::test]
async fn test_story_fan_out_runs_concurrently() {
    let dir = common::temp_dir();
    let delay = Duration::from_millis(200);
    let mock = Arc::new(
        MockProvider::new().with_default_response(MockResponse::success(EPICS_OUTPUT)),
    );
    for n in 1..=3 {
        mock.respond_when(
            story_needle(n),
            MockResponse::success(format!("Stories {n}")).with_delay(delay),
        )
        .await;
    }

    let orchestrator = orchestrator(mock.clone(), &dir);
    let started = Instant::now();
    let job = run_to_end(&orchestrator, "Build a SaaS billing product").await;
    let elapsed = started.elapsed();

    assert_eq!(job.status, PipelineStatus::Completed, "error: {:?}", job.error);
    assert_eq!(job.stories_files.len(), 3);
    assert!(elapsed < delay * 2, "stories ran serially: {elapsed:?}");
}

fn status_rank(status: PipelineStatus) -> u8 {
    match status {
        PipelineStatus::Starting => 0,
        PipelineStatus::GeneratingEpics => 1,
        PipelineStatus::GeneratingStories => 2,
        PipelineStatus::Merging => 3,
        PipelineStatus::Completed | PipelineStatus::Failed => 4,
    }
}

#[tokio::test]
async fn test_observed_status_never_goes_backwards() {
    let dir = common::temp_dir();
    let delay = Duration::from_millis(80);
    let mock = Arc::new(
        MockProvider::new()
            .with_default_response(MockResponse::success(EPICS_OUTPUT).with_delay(delay)),
    );
    for n in 1..=3 {
        mock.respond_when(
            story_needle(n),
            MockResponse::success(format!("Stories {n}")).with_delay(delay),
        )
        .await;
    }

    let orchestrator = orchestrator(mock, &dir);
    let id = orchestrator
        .start_pipeline(
            "sess1",
            "Build a SaaS billing product",
            ExecutionContext::new(),
            LlmSettings::default(),
        )
        .await
        .unwrap();

    let mut seen: Vec<PipelineStatus> = Vec::new();
    let observe = async {
        loop {
            let job = orchestrator.pipeline_status(&id).await.unwrap();
            if seen.last() != Some(&job.status) {
                seen.push(job.status);
            }
            if job.status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(10), observe)
        .await
        .expect("pipeline did not finish in time");

    assert_eq!(seen.last(), Some(&PipelineStatus::Completed), "seen: {seen:?}");
    assert!(seen.contains(&PipelineStatus::GeneratingEpics), "seen: {seen:?}");
    assert!(seen.contains(&PipelineStatus::GeneratingStories), "seen: {seen:?}");
    assert!(
        seen.windows(2).all(|w| status_rank(w[0]) < status_rank(w[1])),
        "status went backwards: {seen:?}"
    );
}
