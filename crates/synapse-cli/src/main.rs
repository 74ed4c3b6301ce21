//! CLI entry point for Synapse.
//!
//! This binary provides the `synapse` command with subcommands for the
//! interactive loop, one-shot requests, parse previews and health checks.

mod cli;
mod helpers;
mod repl;

use anyhow::{Context, Result};
use clap::Parser;
use synapse_agent::{CommandRouter, Credentials};
use synapse_intent::IntentParser;
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::helpers::{init_tracing, join_text, load_config, report_dotenv};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::dotenv();
    init_tracing(&cli.log_level);
    report_dotenv(dotenv);

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Parse { text } => {
            let parser = IntentParser::with_priority(&config.services.priority)
                .context("failed to build intent parser")?;
            let command = parser.parse(&join_text(&text));
            println!("{}", serde_json::to_string_pretty(&command)?);
        }
        Commands::Ask { text, json } => {
            let router = build_router(&config).await?;
            let text = join_text(&text);
            if json {
                let outcome = router.handle_outcome(&text).await;
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", router.handle(&text).await);
            }
        }
        Commands::Status => {
            let router = build_router(&config).await?;
            let report = router.health().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Run => {
            let router = build_router(&config).await?;
            repl::run(&router).await?;
        }
    }

    Ok(())
}

/// Connect every enabled service using credentials from the environment.
async fn build_router(config: &synapse_agent::AgentConfig) -> Result<CommandRouter> {
    let credentials = Credentials::from_env();
    info!(?credentials, "connecting services");
    CommandRouter::from_config(config, credentials)
        .await
        .context("failed to start router")
}
