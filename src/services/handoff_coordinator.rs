//! Keyword-based routing of a request to a primary agent and helpers.
//!
//! Everything here is deterministic text heuristics. Nothing calls an LLM.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AgentRole, AgentTemplate, ExecutionResult, HandoffDecision, SynthesisSummary,
    WorkloadAssignment,
};
use crate::services::dependency_resolver::{DependencyNode, DependencyResolver};
use crate::services::template_store::TemplateStore;

/// Keyword buckets checked in order; the first hit picks the primary agent.
const ROUTING_RULES: &[(AgentRole, &[&str])] = &[
    (
        AgentRole::UiDesigner,
        &["visual", "design", "color", "layout", "aesthetic"],
    ),
    (
        AgentRole::UxResearcher,
        &["user", "experience", "usability", "accessibility", "flow"],
    ),
    (
        AgentRole::Developer,
        &["technical", "implement", "code", "performance", "architecture"],
    ),
    (
        AgentRole::ProductManager,
        &["business", "requirement", "feature", "product", "strategy"],
    ),
];

const BREADTH_KEYWORDS: &[&str] = &["comprehensive", "complete", "full", "detailed"];

/// Requests longer than this many words get supporting agents.
const COMPLEX_REQUEST_WORDS: usize = 20;
const COMPLEX_SUPPORT_COUNT: usize = 2;
const BREADTH_SUPPORT_COUNT: usize = 3;
const DECISION_CONFIDENCE: f64 = 0.8;

/// Only words longer than this count towards common themes.
const THEME_MIN_WORD_LEN: usize = 4;
const MAX_THEMES: usize = 5;
/// Peer focus areas listed in an enriched context.
const PEER_FOCUS_PREVIEW: usize = 2;

const NEXT_STEPS: [&str; 3] = [
    "Review agent recommendations",
    "Implement high-priority suggestions",
    "Consider agent coordination feedback",
];

fn focus_areas(role: AgentRole) -> Vec<String> {
    let areas: &[&str] = match role {
        AgentRole::UiDesigner => &["Visual design", "Layout structure", "Color scheme", "Typography"],
        AgentRole::UxResearcher => &["User experience", "Usability", "Accessibility", "User flows"],
        AgentRole::Developer => &[
            "Technical feasibility",
            "Implementation approach",
            "Performance",
            "Architecture",
        ],
        AgentRole::ProductManager => &[
            "Business requirements",
            "User needs",
            "Feature prioritization",
            "Strategy",
        ],
        _ => &["General analysis"],
    };
    areas.iter().map(ToString::to_string).collect()
}

fn specific_questions(role: AgentRole) -> Vec<String> {
    let questions: &[&str] = match role {
        AgentRole::UiDesigner => &[
            "How can the visual hierarchy be improved?",
            "What design patterns would work best here?",
            "Are there any visual accessibility concerns?",
        ],
        AgentRole::UxResearcher => &[
            "How does this align with user needs?",
            "What usability issues might arise?",
            "How can the user flow be optimized?",
        ],
        AgentRole::Developer => &[
            "What are the technical implementation challenges?",
            "How can performance be optimized?",
            "What architecture decisions are needed?",
        ],
        AgentRole::ProductManager => &[
            "How does this align with business goals?",
            "What's the priority of different features?",
            "What are the success metrics?",
        ],
        _ => &["How can this be improved?"],
    };
    questions.iter().map(ToString::to_string).collect()
}

/// Routes requests to agents and merges their output.
pub struct HandoffCoordinator {
    store: Arc<TemplateStore>,
    resolver: DependencyResolver,
}

impl HandoffCoordinator {
    pub fn new(store: Arc<TemplateStore>) -> Self {
        Self {
            store,
            resolver: DependencyResolver::new(),
        }
    }

    /// Pick a primary agent by keyword and supporting agents by request size.
    ///
    /// Falls back to `current_agent` when no keyword matches.
    pub fn evaluate_handoff_needs(
        &self,
        user_input: &str,
        current_agent: AgentRole,
        recent_results: &[ExecutionResult],
    ) -> HandoffDecision {
        let input = user_input.to_lowercase();
        tracing::debug!(recent_results = recent_results.len(), "evaluating handoff");

        let primary = ROUTING_RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| input.contains(k)))
            .map_or(current_agent, |(role, _)| *role);

        let support_count = if input.split_whitespace().count() > COMPLEX_REQUEST_WORDS {
            COMPLEX_SUPPORT_COUNT
        } else if BREADTH_KEYWORDS.iter().any(|k| input.contains(k)) {
            BREADTH_SUPPORT_COUNT
        } else {
            0
        };

        let supporting: Vec<AgentRole> = AgentRole::ALL
            .iter()
            .copied()
            .filter(|role| *role != primary)
            .take(support_count)
            .collect();

        let reasoning = format!(
            "Primary: {primary}, Supporting: [{}]",
            supporting
                .iter()
                .map(AgentRole::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );

        HandoffDecision {
            primary_agent: primary,
            requires_parallel_processing: !supporting.is_empty(),
            requires_synthesis: supporting.len() > 1,
            supporting_agents: supporting,
            confidence: DECISION_CONFIDENCE,
            reasoning,
        }
    }

    /// One assignment for the primary agent, then one per supporting agent.
    ///
    /// Supporting agents wait for the primary only when the decision does
    /// not call for parallel processing.
    pub fn create_workload_assignments(
        &self,
        decision: &HandoffDecision,
        _user_input: &str,
    ) -> Vec<WorkloadAssignment> {
        let primary = decision.primary_agent;
        let mut assignments = vec![assignment(primary, 1, Vec::new())];

        for (i, role) in decision.supporting_agents.iter().enumerate() {
            let dependencies = if decision.requires_parallel_processing {
                Vec::new()
            } else {
                vec![primary]
            };
            #[allow(clippy::cast_possible_truncation)]
            let priority = i as u32 + 2;
            assignments.push(assignment(*role, priority, dependencies));
        }
        assignments
    }

    /// Briefing text for one agent, including what its peers focus on.
    pub fn create_enriched_context(
        &self,
        agent_type: AgentRole,
        user_input: &str,
        assignment: &WorkloadAssignment,
        peers: &[WorkloadAssignment],
    ) -> String {
        let mut lines = vec![
            format!("USER REQUEST: {user_input}"),
            String::new(),
            format!("YOUR ROLE: {}", agent_type.title()),
            format!("PRIORITY: {}", assignment.priority),
            String::new(),
            "FOCUS AREAS:".to_string(),
        ];
        lines.extend(assignment.focus_areas.iter().map(|a| format!("- {a}")));
        lines.push(String::new());
        lines.push("SPECIFIC QUESTIONS TO ADDRESS:".to_string());
        lines.extend(assignment.specific_questions.iter().map(|q| format!("- {q}")));

        if !peers.is_empty() {
            lines.push(String::new());
            lines.push("PEER AGENT COORDINATION:".to_string());
            for peer in peers {
                let preview: Vec<&str> = peer
                    .focus_areas
                    .iter()
                    .take(PEER_FOCUS_PREVIEW)
                    .map(String::as_str)
                    .collect();
                lines.push(format!("- {}: {}", peer.agent_type, preview.join(", ")));
            }
        }

        lines.join("\n")
    }

    /// Merge results by counting repeated words across their suggestions.
    pub fn synthesize_responses(
        &self,
        results: &[ExecutionResult],
        _user_input: &str,
    ) -> SynthesisSummary {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();

        for suggestion in results.iter().flat_map(|r| &r.suggestions) {
            for word in suggestion.to_lowercase().split_whitespace() {
                if word.chars().count() <= THEME_MIN_WORD_LEN {
                    continue;
                }
                let count = counts.entry(word.to_string()).or_insert(0);
                if *count == 0 {
                    order.push(word.to_string());
                }
                *count += 1;
            }
        }

        let common_themes: Vec<String> = order
            .into_iter()
            .filter(|word| counts.get(word).is_some_and(|&c| c > 1))
            .take(MAX_THEMES)
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let overall_confidence = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.confidence_level).sum::<f64>() / results.len() as f64
        };

        SynthesisSummary {
            coordination_summary: format!("Processed by {} agents", results.len()),
            common_themes,
            conflicting_recommendations: Vec::new(),
            next_steps: NEXT_STEPS.iter().map(ToString::to_string).collect(),
            overall_confidence,
        }
    }

    /// Group assignments into waves; each wave only depends on earlier ones.
    pub fn execution_order(
        &self,
        assignments: &[WorkloadAssignment],
    ) -> DomainResult<Vec<Vec<AgentRole>>> {
        let nodes: Vec<DependencyNode> = assignments
            .iter()
            .map(|a| DependencyNode::new(a.agent_type.as_str(), a.dependencies.iter().map(AgentRole::as_str)))
            .collect();

        self.resolver
            .execution_stages(&nodes)?
            .into_iter()
            .map(|stage| {
                stage
                    .iter()
                    .map(|id| id.parse::<AgentRole>().map_err(DomainError::ValidationFailed))
                    .collect()
            })
            .collect()
    }

    /// Active template playing `role`.
    pub async fn template_for_role(&self, role: AgentRole) -> DomainResult<AgentTemplate> {
        self.store
            .get_by_type(role.template_type())
            .await
            .ok_or_else(|| DomainError::TemplateNotFound(role.template_type().default_template_id()))
    }
}

fn assignment(role: AgentRole, priority: u32, dependencies: Vec<AgentRole>) -> WorkloadAssignment {
    WorkloadAssignment {
        agent_type: role,
        priority,
        focus_areas: focus_areas(role),
        specific_questions: specific_questions(role),
        dependencies,
    }
}
