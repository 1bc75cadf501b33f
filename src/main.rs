//! Conclave CLI entry point.

use anyhow::Result;
use clap::Parser;

use conclave::cli::commands;
use conclave::cli::{AppContext, Cli, Commands};
use conclave::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(err) = run(cli).await {
        conclave::cli::handle_error(err, json_mode);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppContext::load_config(cli.config.as_deref())?;
    let _logger = LoggerImpl::init(&config.logging)?;
    let ctx = AppContext::build(config).await?;

    match cli.command {
        Commands::Providers => commands::providers::execute(&ctx, cli.json).await,
        Commands::Templates(args) => commands::templates::execute(args, &ctx, cli.json).await,
        Commands::Route(args) => commands::route::execute(args, &ctx, cli.json).await,
        Commands::Run(args) => commands::run::execute(args, &ctx, cli.json).await,
        Commands::Plan(args) => commands::plan::execute(args, &ctx, cli.json).await,
    }
}
