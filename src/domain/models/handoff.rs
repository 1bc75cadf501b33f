//! Handoff coordination types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::models::template::AgentTemplateType;

/// Agents the coordinator can route work to.
///
/// Declaration order matters: supporting agents are picked from the front
/// of [`AgentRole::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    UiDesigner,
    UxResearcher,
    Developer,
    ProductManager,
    Stakeholder,
    EpicGenerator,
    StoryGenerator,
    QaPlanner,
    ReviewAgent,
    DevelopmentPlanner,
    LegoBuilder,
}

impl AgentRole {
    pub const ALL: [Self; 11] = [
        Self::UiDesigner,
        Self::UxResearcher,
        Self::Developer,
        Self::ProductManager,
        Self::Stakeholder,
        Self::EpicGenerator,
        Self::StoryGenerator,
        Self::QaPlanner,
        Self::ReviewAgent,
        Self::DevelopmentPlanner,
        Self::LegoBuilder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UiDesigner => "ui_designer",
            Self::UxResearcher => "ux_researcher",
            Self::Developer => "developer",
            Self::ProductManager => "product_manager",
            Self::Stakeholder => "stakeholder",
            Self::EpicGenerator => "epic_generator",
            Self::StoryGenerator => "story_generator",
            Self::QaPlanner => "qa_planner",
            Self::ReviewAgent => "review_agent",
            Self::DevelopmentPlanner => "development_planner",
            Self::LegoBuilder => "lego_builder",
        }
    }

    /// `ui_designer` -> `Ui Designer`.
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Template type that plays this role.
    pub fn template_type(&self) -> AgentTemplateType {
        match self {
            Self::UiDesigner => AgentTemplateType::UiDesigner,
            Self::UxResearcher => AgentTemplateType::UxResearcher,
            Self::Developer => AgentTemplateType::Developer,
            Self::ProductManager => AgentTemplateType::ProductManager,
            Self::Stakeholder => AgentTemplateType::Stakeholder,
            Self::EpicGenerator => AgentTemplateType::EpicsGenerator,
            Self::StoryGenerator => AgentTemplateType::StoriesGenerator,
            Self::QaPlanner => AgentTemplateType::QaEngineer,
            Self::ReviewAgent => AgentTemplateType::Critique,
            Self::DevelopmentPlanner => AgentTemplateType::DevelopmentPlanner,
            Self::LegoBuilder => AgentTemplateType::LegoBuilder,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == needle)
            .ok_or_else(|| format!("Unknown agent role: {s}"))
    }
}

/// Which agents should handle a request and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffDecision {
    pub primary_agent: AgentRole,
    pub supporting_agents: Vec<AgentRole>,
    /// Set iff there are supporting agents.
    pub requires_parallel_processing: bool,
    /// Set iff there is more than one supporting agent.
    pub requires_synthesis: bool,
    pub confidence: f64,
    pub reasoning: String,
}

/// Work assigned to one agent for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadAssignment {
    pub agent_type: AgentRole,
    /// 1 is the primary agent.
    pub priority: u32,
    pub focus_areas: Vec<String>,
    pub specific_questions: Vec<String>,
    pub dependencies: Vec<AgentRole>,
}

/// Heuristic merge of several agent results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisSummary {
    pub coordination_summary: String,
    pub common_themes: Vec<String>,
    /// Always empty; conflict detection is not implemented.
    pub conflicting_recommendations: Vec<String>,
    pub next_steps: Vec<String>,
    pub overall_confidence: f64,
}
