//! `.env` setup and validation

use anyhow::Context;
use clap::Subcommand;
use std::path::PathBuf;

use storefront_common::env::{self, EnvFileStatus, REQUIRED_VARS};

use crate::output::{print_error, print_info, print_success, print_warning};

#[derive(Subcommand)]
pub enum EnvCommands {
    /// Create .env from .env.example if it does not exist
    Setup {
        /// Directory holding the env files
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Check that the required variables are set
    Check {
        /// Directory holding the env files
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

pub fn execute(cmd: EnvCommands) -> anyhow::Result<()> {
    match cmd {
        EnvCommands::Setup { dir } => setup(dir),
        EnvCommands::Check { dir } => check(dir),
    }
}

fn setup(dir: PathBuf) -> anyhow::Result<()> {
    let status = env::setup_env_file(&dir)
        .with_context(|| format!("cannot set up .env in {}", dir.display()))?;
    match status {
        EnvFileStatus::Found => print_success(".env file found"),
        EnvFileStatus::Created => {
            print_warning(".env created from .env.example");
            print_info(&format!("Update it with your credentials: {}", REQUIRED_VARS.join(", ")));
        }
    }
    Ok(())
}

fn check(dir: PathBuf) -> anyhow::Result<()> {
    env::load_env_file(&dir)?;
    let missing = env::missing_required(|key| std::env::var(key).ok());
    if missing.is_empty() {
        print_success("All required environment variables are set");
        return Ok(());
    }

    for key in &missing {
        print_error(&format!("{} is not set", key));
    }
    env::check_required(|key| std::env::var(key).ok())?;
    Ok(())
}
