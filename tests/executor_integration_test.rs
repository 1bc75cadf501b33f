//! Integration tests for dependency-ordered template execution.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{executor_with, template};
use conclave::adapters::providers::{MockProvider, MockResponse};
use conclave::domain::models::{ExecutionContext, LlmSettings};
use conclave::DomainError;

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::test]
async fn test_results_follow_caller_order() {
    common::setup_test_logging();
    let mock = Arc::new(MockProvider::new());
    let executor = executor_with(
        mock.clone(),
        vec![
            template("base", "BASE PERSONA", &[]),
            template("middle", "MIDDLE PERSONA", &["base"]),
            template("top", "TOP PERSONA", &["middle"]),
        ],
    );

    let results = executor
        .execute_templates(
            &ids(&["top", "base", "middle"]),
            "Build a todo app",
            &ExecutionContext::new(),
            &LlmSettings::default(),
        )
        .await
        .unwrap();

    let order: Vec<&str> = results.iter().map(|r| r.template_id.as_str()).collect();
    assert_eq!(order, vec!["top", "base", "middle"]);
    assert_eq!(mock.call_count().await, 3);
}

#[tokio::test]
async fn test_dependent_sees_upstream_content() {
    let mock = Arc::new(MockProvider::new());
    mock.respond_when("EPIC GEN PERSONA", MockResponse::success("Epic A content"))
        .await;
    mock.respond_when("DEV REVIEW PERSONA", MockResponse::success("Looks feasible"))
        .await;

    let executor = executor_with(
        mock.clone(),
        vec![
            template("epic_gen", "EPIC GEN PERSONA", &[]),
            template("dev_review", "DEV REVIEW PERSONA", &["epic_gen"]),
        ],
    );

    let results = executor
        .execute_templates(
            &ids(&["epic_gen", "dev_review"]),
            "Plan a marketplace",
            &ExecutionContext::new(),
            &LlmSettings::default(),
        )
        .await
        .unwrap();

    assert_eq!(results[0].content, "Epic A content");
    let review_calls = mock.calls_matching("DEV REVIEW PERSONA").await;
    assert_eq!(review_calls.len(), 1);
    let prompt = review_calls[0].prompt_text();
    assert!(prompt.contains("PREVIOUS AGENT ANALYSES:"));
    assert!(prompt.contains("=== epic gen ===\nEpic A content"));
}

#[tokio::test]
async fn test_dependent_runs_after_upstream_finishes() {
    let mock = Arc::new(MockProvider::new());
    mock.respond_when(
        "SLOW PERSONA",
        MockResponse::success("slow output").with_delay(Duration::from_millis(50)),
    )
    .await;

    let executor = executor_with(
        mock.clone(),
        vec![
            template("slow", "SLOW PERSONA", &[]),
            template("fast", "FAST PERSONA", &["slow"]),
        ],
    );

    executor
        .execute_templates(
            &ids(&["fast", "slow"]),
            "x",
            &ExecutionContext::new(),
            &LlmSettings::default(),
        )
        .await
        .unwrap();

    let calls = mock.calls().await;
    assert!(calls[0].prompt_text().contains("SLOW PERSONA"));
    assert!(calls[1].prompt_text().contains("slow output"));
}

#[tokio::test]
async fn test_failed_dependency_is_passed_on_degraded() {
    let mock = Arc::new(MockProvider::new());
    mock.respond_when("UPSTREAM PERSONA", MockResponse::failure("rate limited"))
        .await;

    let executor = executor_with(
        mock.clone(),
        vec![
            template("upstream", "UPSTREAM PERSONA", &[]),
            template("downstream", "DOWNSTREAM PERSONA", &["upstream"]),
        ],
    );

    let results = executor
        .execute_templates(
            &ids(&["upstream", "downstream"]),
            "x",
            &ExecutionContext::new(),
            &LlmSettings::default(),
        )
        .await
        .unwrap();

    assert!(results[0].is_degraded());
    assert_eq!(results[0].confidence_level, 0.0);
    assert!(!results[1].is_degraded());

    let downstream = mock.calls_matching("DOWNSTREAM PERSONA").await;
    assert_eq!(downstream.len(), 1);
    assert!(downstream[0]
        .prompt_text()
        .contains("Error executing agent:"));
}

#[tokio::test]
async fn test_cycle_fails_without_llm_calls() {
    let mock = Arc::new(MockProvider::new());
    let executor = executor_with(
        mock.clone(),
        vec![
            template("a", "A", &["b"]),
            template("b", "B", &["a"]),
        ],
    );

    let err = executor
        .execute_templates(
            &ids(&["a", "b"]),
            "x",
            &ExecutionContext::new(),
            &LlmSettings::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::CircularDependency(_)));
    assert_eq!(mock.call_count().await, 0);
}

#[tokio::test]
async fn test_unknown_template_fails_without_llm_calls() {
    let mock = Arc::new(MockProvider::new());
    let executor = executor_with(mock.clone(), vec![template("a", "A", &[])]);

    let err = executor
        .execute_templates(
            &ids(&["a", "ghost"]),
            "x",
            &ExecutionContext::new(),
            &LlmSettings::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::TemplateNotFound(id) if id == "ghost"));
    assert_eq!(mock.call_count().await, 0);
}

#[tokio::test]
async fn test_dependency_outside_selection_is_ignored() {
    let mock = Arc::new(MockProvider::new());
    let executor = executor_with(
        mock.clone(),
        vec![
            template("a", "A", &[]),
            template("b", "B PERSONA", &["a"]),
        ],
    );

    let results = executor
        .execute_templates(&ids(&["b"]), "x", &ExecutionContext::new(), &LlmSettings::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(mock.call_count().await, 1);
    assert!(!mock.calls().await[0]
        .prompt_text()
        .contains("PREVIOUS AGENT ANALYSES:"));
}

#[tokio::test]
async fn test_variation_agent_produces_five_analyses() {
    let mock = Arc::new(MockProvider::new());
    mock.respond_when("variation #3", MockResponse::failure("timeout"))
        .await;
    let executor = executor_with(mock.clone(), vec![]);

    let result = executor
        .execute_template(
            "rerun_default",
            "Design an onboarding flow",
            &ExecutionContext::new(),
            &LlmSettings::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.rerun_results.len(), 5);
    assert!(result.rerun_results.iter().all(|r| !r.is_empty()));
    assert!(result.rerun_results[2].starts_with("Analysis #3:\nError getting response:"));
    assert!(!result.is_degraded());
    assert_eq!(mock.call_count().await, 5);
}

#[tokio::test]
async fn test_question_agent_caps_questions() {
    let reply: String = (1..=12)
        .map(|i| format!("{i}. What about aspect number {i}?\n"))
        .collect();
    let mock = Arc::new(MockProvider::new().with_default_response(MockResponse::success(reply)));
    let executor = executor_with(mock, vec![]);

    let result = executor
        .execute_template(
            "questions_default",
            "x",
            &ExecutionContext::new(),
            &LlmSettings::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.questions.len(), 10);
    assert!(result.questions.iter().all(|q| q.contains('?')));
}

#[tokio::test]
async fn test_stage_siblings_run_concurrently() {
    let delay = Duration::from_millis(200);
    let mock = Arc::new(
        MockProvider::new().with_default_response(MockResponse::success("done").with_delay(delay)),
    );
    let executor = executor_with(
        mock.clone(),
        vec![
            template("alpha", "ALPHA PERSONA", &[]),
            template("beta", "BETA PERSONA", &[]),
            template("gamma", "GAMMA PERSONA", &[]),
        ],
    );

    let started = Instant::now();
    let results = executor
        .execute_templates(
            &ids(&["alpha", "beta", "gamma"]),
            "Build a todo app",
            &ExecutionContext::new(),
            &LlmSettings::default(),
        )
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.error.is_none()));
    assert_eq!(mock.call_count().await, 3);
    assert!(elapsed < delay * 2, "siblings ran serially: {elapsed:?}");
}
