//! Storefront CLI - Main Entry Point
//!
//! Runs the storefront scenario catalogue against the live site and manages
//! the local `.env` used for test credentials.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use storefront_cli::commands::{env, list, preflight, run};
use storefront_cli::output;

/// Storefront E2E - browser checks for the VapeInItaly storefront
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Harness configuration file (TOML)
    #[arg(short, long, global = true, env = "STOREFRONT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios against the storefront
    Run(run::RunArgs),

    /// List registered scenarios
    List(list::ListArgs),

    /// Manage the local .env file
    #[command(subcommand)]
    Env(env::EnvCommands),

    /// Check that the storefront is reachable
    Preflight,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run(args) => {
            let config = storefront_cli::commands::load_config(cli.config.as_deref())?;
            if !run::execute(args, config, cli.format).await? {
                std::process::exit(1);
            }
        }
        Commands::List(args) => list::execute(args, cli.format)?,
        Commands::Env(cmd) => env::execute(cmd)?,
        Commands::Preflight => {
            let config = storefront_cli::commands::load_config(cli.config.as_deref())?;
            preflight::execute(config).await?;
        }
        Commands::Version => {
            println!("Storefront E2E CLI v{}", storefront_common::VERSION);
            println!("Browser checks for the VapeInItaly storefront");
            println!();
            println!("Scenarios: {}", storefront_e2e::catalogue().len());
        }
    }

    Ok(())
}
