//! Show how a request would be routed across agents.

use anyhow::Result;
use clap::Args;

use crate::cli::context::AppContext;
use crate::cli::output::{list_table, output, CommandOutput};
use crate::domain::models::{AgentRole, HandoffDecision, WorkloadAssignment};
use crate::services::HandoffCoordinator;

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// The user request
    #[arg(short, long)]
    pub input: String,

    /// Agent that keeps the request when no keyword matches
    #[arg(long, default_value = "developer")]
    pub current: AgentRole,
}

#[derive(Debug, serde::Serialize)]
pub struct RoutedAssignment {
    #[serde(flatten)]
    pub assignment: WorkloadAssignment,
    pub template_id: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct RouteOutput {
    pub decision: HandoffDecision,
    pub assignments: Vec<RoutedAssignment>,
    pub waves: Vec<Vec<AgentRole>>,
}

impl CommandOutput for RouteOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["priority", "agent", "template", "waits for"]);
        for routed in &self.assignments {
            let waits: Vec<&str> = routed
                .assignment
                .dependencies
                .iter()
                .map(AgentRole::as_str)
                .collect();
            table.add_row(vec![
                routed.assignment.priority.to_string(),
                routed.assignment.agent_type.to_string(),
                routed.template_id.clone().unwrap_or_else(|| "-".to_string()),
                waits.join(", "),
            ]);
        }

        let waves: Vec<String> = self
            .waves
            .iter()
            .enumerate()
            .map(|(i, wave)| {
                let roles: Vec<&str> = wave.iter().map(AgentRole::as_str).collect();
                format!("  {}. {}", i + 1, roles.join(", "))
            })
            .collect();

        format!(
            "{}\nparallel: {} | synthesis: {} | confidence: {:.2}\n\n{table}\n\nWaves:\n{}",
            self.decision.reasoning,
            self.decision.requires_parallel_processing,
            self.decision.requires_synthesis,
            self.decision.confidence,
            waves.join("\n")
        )
    }
}

pub async fn execute(args: RouteArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let coordinator = HandoffCoordinator::new(ctx.store.clone());
    let decision = coordinator.evaluate_handoff_needs(&args.input, args.current, &[]);
    let assignments = coordinator.create_workload_assignments(&decision, &args.input);
    let waves = coordinator.execution_order(&assignments)?;

    let mut routed = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let template_id = coordinator
            .template_for_role(assignment.agent_type)
            .await
            .ok()
            .map(|t| t.id);
        routed.push(RoutedAssignment {
            assignment,
            template_id,
        });
    }

    let out = RouteOutput {
        decision,
        assignments: routed,
        waves,
    };
    output(&out, json_mode);
    Ok(())
}
