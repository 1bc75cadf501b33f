//! Agent template CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::{list_table, output, render_list, truncate, CommandOutput};
use crate::domain::models::AgentTemplate;

#[derive(Args, Debug)]
pub struct TemplateArgs {
    #[command(subcommand)]
    pub command: TemplateCommands,
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// List agent templates
    List {
        /// Show only active templates
        #[arg(long)]
        active: bool,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct TemplateOutput {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub template_type: String,
    pub is_active: bool,
    pub is_custom: bool,
    pub depends_on: Vec<String>,
}

impl From<&AgentTemplate> for TemplateOutput {
    fn from(template: &AgentTemplate) -> Self {
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            template_type: template.template_type.to_string(),
            is_active: template.is_active,
            is_custom: template.is_custom,
            depends_on: template.depends_on.clone(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct TemplateListOutput {
    pub templates: Vec<TemplateOutput>,
    pub total: usize,
}

impl CommandOutput for TemplateListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "active", "custom", "depends on"]);
        for t in &self.templates {
            table.add_row(vec![
                truncate(&t.id, 32),
                truncate(&t.name, 24),
                if t.is_active { "yes" } else { "no" }.to_string(),
                if t.is_custom { "yes" } else { "no" }.to_string(),
                t.depends_on.join(", "),
            ]);
        }
        render_list("template", &table, self.total)
    }
}

pub async fn execute(args: TemplateArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    match args.command {
        TemplateCommands::List { active } => {
            let templates = if active {
                ctx.store.active().await
            } else {
                ctx.store.list().await
            };

            let out = TemplateListOutput {
                total: templates.len(),
                templates: templates.iter().map(TemplateOutput::from).collect(),
            };
            output(&out, json_mode);
        }
    }
    Ok(())
}
