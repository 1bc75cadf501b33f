//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::plan::PlanArgs;
use crate::cli::commands::route::RouteArgs;
use crate::cli::commands::run::RunArgs;
use crate::cli::commands::templates::TemplateArgs;

#[derive(Parser)]
#[command(name = "conclave")]
#[command(about = "Conclave - multi-agent LLM orchestration", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .conclave/config.yaml + local.yaml)
    #[arg(short, long, global = true, env = "CONCLAVE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show which LLM providers are configured and their models
    Providers,

    /// Agent template commands
    Templates(TemplateArgs),

    /// Execute templates in dependency order
    Run(RunArgs),

    /// Show which agents a request would be routed to, without calling an LLM
    Route(RouteArgs),

    /// Generate a development plan (epics, stories, merged markdown)
    Plan(PlanArgs),
}
