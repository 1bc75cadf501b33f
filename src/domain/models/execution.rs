//! Execution context, LLM settings and per-agent results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many history entries are rendered into the prompt.
pub const HISTORY_WINDOW: usize = 5;

/// How many suggestions of each upstream result are rendered downstream.
pub const DEPENDENCY_SUGGESTION_LIMIT: usize = 3;

/// Caller-supplied context for an execution.
///
/// `dependency_results` is filled by the executor with the results of a
/// template's already-executed dependencies; callers normally leave it empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    #[serde(default)]
    pub conversation_history: Vec<String>,
    #[serde(default)]
    pub current_prototype: Option<serde_json::Value>,
    #[serde(default)]
    pub session_preferences: Option<String>,
    #[serde(default)]
    pub dependency_results: Vec<ExecutionResult>,
    /// Free-form extra fields (e.g. `current_epic`, `epic_number`).
    #[serde(default)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history<I, S>(mut self, history: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conversation_history = history.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prototype(mut self, prototype: serde_json::Value) -> Self {
        self.current_prototype = Some(prototype);
        self
    }

    pub fn with_preferences(mut self, preferences: impl Into<String>) -> Self {
        self.session_preferences = Some(preferences.into());
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    /// Copy of this context carrying the given upstream results.
    pub fn with_dependency_results(&self, results: Vec<ExecutionResult>) -> Self {
        Self {
            dependency_results: results,
            ..self.clone()
        }
    }

    /// Render the context block placed between the persona prompt and the
    /// user request. Empty sections are omitted; an empty context renders
    /// as an empty string.
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if !self.conversation_history.is_empty() {
            parts.push("CONVERSATION HISTORY:".to_string());
            let skip = self.conversation_history.len().saturating_sub(HISTORY_WINDOW);
            for entry in self.conversation_history.iter().skip(skip) {
                parts.push(format!("- {entry}"));
            }
            parts.push(String::new());
        }

        if let Some(prototype) = self.current_prototype.as_ref().filter(|p| !p.is_null()) {
            parts.push("CURRENT PROTOTYPE STATE:".to_string());
            parts.push(
                serde_json::to_string_pretty(prototype).unwrap_or_else(|_| prototype.to_string()),
            );
            parts.push(String::new());
        }

        if let Some(prefs) = self.session_preferences.as_ref().filter(|p| !p.is_empty()) {
            parts.push("USER PREFERENCES:".to_string());
            parts.push(prefs.clone());
            parts.push(String::new());
        }

        if !self.dependency_results.is_empty() {
            parts.push("PREVIOUS AGENT ANALYSES:".to_string());
            for result in &self.dependency_results {
                parts.push(format!("\n=== {} ===", result.agent_name));
                parts.push(result.content.clone());
                if !result.suggestions.is_empty() {
                    parts.push("\nKey Suggestions:".to_string());
                    for suggestion in result.suggestions.iter().take(DEPENDENCY_SUGGESTION_LIMIT) {
                        parts.push(format!("- {suggestion}"));
                    }
                }
            }
            parts.push(String::new());
        }

        parts.join("\n")
    }
}

/// Per-call LLM overrides. Unset fields fall back to executor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LlmSettings {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Output of one agent execution. Degraded results carry `error` and a
/// confidence of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub template_id: String,
    pub agent_name: String,
    pub content: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub critique: Option<String>,
    pub confidence_level: f64,
    /// Wall-clock seconds.
    pub execution_time: f64,
    #[serde(default)]
    pub alternative_ideas: Vec<String>,
    #[serde(default)]
    pub rerun_results: Vec<String>,
    #[serde(default)]
    pub competitor_analysis: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// A result with only the content filled in.
    pub fn new(
        template_id: impl Into<String>,
        agent_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            template_id: template_id.into(),
            agent_name: agent_name.into(),
            content: content.into(),
            suggestions: Vec::new(),
            questions: Vec::new(),
            critique: None,
            confidence_level: 0.0,
            execution_time: 0.0,
            alternative_ideas: Vec::new(),
            rerun_results: Vec::new(),
            competitor_analysis: None,
            error: None,
        }
    }

    /// A result standing in for a failed LLM call.
    pub fn degraded(
        template_id: impl Into<String>,
        agent_name: impl Into<String>,
        error: impl Into<String>,
        execution_time: f64,
    ) -> Self {
        let error = error.into();
        Self {
            execution_time,
            error: Some(error.clone()),
            ..Self::new(template_id, agent_name, format!("Error executing agent: {error}"))
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
