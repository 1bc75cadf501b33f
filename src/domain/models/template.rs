//! Agent template domain model.
//!
//! A template is a named persona (system prompt plus metadata) that the
//! executor runs against an LLM. Templates may declare dependencies on
//! other templates; the executor orders a batch so that dependencies run
//! first and their output is visible downstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Persona category of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentTemplateType {
    UiDesigner,
    UxResearcher,
    Developer,
    ProductManager,
    Stakeholder,
    CompanyCompetitor,
    Critique,
    Coach,
    /// Runs the request several times at rising temperatures.
    Rerun,
    /// Produces a list of strategic questions instead of an analysis.
    Questions,
    DataScientist,
    MarketingSpecialist,
    AccessibilityExpert,
    PerformanceEngineer,
    ContentStrategist,
    QaEngineer,
    Synthesizer,
    PrdCreator,
    DevelopmentPlanner,
    LegoBuilder,
    EpicsGenerator,
    StoriesGenerator,
}

impl AgentTemplateType {
    /// All template types in declaration order.
    pub const ALL: [Self; 22] = [
        Self::UiDesigner,
        Self::UxResearcher,
        Self::Developer,
        Self::ProductManager,
        Self::Stakeholder,
        Self::CompanyCompetitor,
        Self::Critique,
        Self::Coach,
        Self::Rerun,
        Self::Questions,
        Self::DataScientist,
        Self::MarketingSpecialist,
        Self::AccessibilityExpert,
        Self::PerformanceEngineer,
        Self::ContentStrategist,
        Self::QaEngineer,
        Self::Synthesizer,
        Self::PrdCreator,
        Self::DevelopmentPlanner,
        Self::LegoBuilder,
        Self::EpicsGenerator,
        Self::StoriesGenerator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UiDesigner => "ui_designer",
            Self::UxResearcher => "ux_researcher",
            Self::Developer => "developer",
            Self::ProductManager => "product_manager",
            Self::Stakeholder => "stakeholder",
            Self::CompanyCompetitor => "company_competitor",
            Self::Critique => "critique",
            Self::Coach => "coach",
            Self::Rerun => "rerun",
            Self::Questions => "questions",
            Self::DataScientist => "data_scientist",
            Self::MarketingSpecialist => "marketing_specialist",
            Self::AccessibilityExpert => "accessibility_expert",
            Self::PerformanceEngineer => "performance_engineer",
            Self::ContentStrategist => "content_strategist",
            Self::QaEngineer => "qa_engineer",
            Self::Synthesizer => "synthesizer",
            Self::PrdCreator => "prd_creator",
            Self::DevelopmentPlanner => "development_planner",
            Self::LegoBuilder => "lego_builder",
            Self::EpicsGenerator => "epics_generator",
            Self::StoriesGenerator => "stories_generator",
        }
    }

    /// Id of the built-in template for this type.
    pub fn default_template_id(&self) -> String {
        format!("{}_default", self.as_str())
    }
}

impl fmt::Display for AgentTemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentTemplateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| format!("Unknown template type: {s}"))
    }
}

/// A named agent persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTemplate {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub template_type: AgentTemplateType,
    pub description: String,
    /// System instructions sent with every call.
    pub prompt: String,
    pub color: String,
    pub icon: String,
    pub is_active: bool,
    /// Built-in templates have this unset and cannot be deleted.
    pub is_custom: bool,
    /// Ids of templates whose output this template consumes.
    #[serde(default)]
    pub depends_on: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentTemplate {
    /// Create an active built-in template with empty prompt and description.
    pub fn new(id: impl Into<String>, name: impl Into<String>, template_type: AgentTemplateType) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            template_type,
            description: String::new(),
            prompt: String::new(),
            color: "#6B7280".to_string(),
            icon: "🤖".to_string(),
            is_active: true,
            is_custom: false,
            depends_on: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_style(mut self, color: impl Into<String>, icon: impl Into<String>) -> Self {
        self.color = color.into();
        self.icon = icon.into();
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn custom(mut self) -> Self {
        self.is_custom = true;
        self
    }
}

/// Request to create a custom template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub template_type: AgentTemplateType,
    pub description: String,
    pub prompt: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Partial update of an existing template. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub prompt: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
    pub depends_on: Option<Vec<String>>,
}

/// Snapshot of the store, also the on-disk persistence format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateCollection {
    pub templates: Vec<AgentTemplate>,
    pub active_templates: Vec<String>,
}
