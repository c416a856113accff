//! `.env` file management for local runs

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{ENV_USER_EMAIL, ENV_USER_PASSWORD};
use crate::error::{Error, Result};

/// Variables a run against the live storefront cannot do without
pub const REQUIRED_VARS: &[&str] = &[ENV_USER_EMAIL, ENV_USER_PASSWORD];

/// What `setup_env_file` found or did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFileStatus {
    Found,
    Created,
}

pub fn env_file(dir: &Path) -> PathBuf {
    dir.join(".env")
}

pub fn env_example_file(dir: &Path) -> PathBuf {
    dir.join(".env.example")
}

/// Ensure `<dir>/.env` exists, creating it from `.env.example` when missing
pub fn setup_env_file(dir: &Path) -> Result<EnvFileStatus> {
    let env_path = env_file(dir);
    if env_path.exists() {
        info!(".env file found at {}", env_path.display());
        return Ok(EnvFileStatus::Found);
    }

    let example = env_example_file(dir);
    if !example.exists() {
        return Err(Error::EnvExampleMissing);
    }

    std::fs::copy(&example, &env_path)?;
    warn!(
        "Created {} from .env.example; update it with your credentials",
        env_path.display()
    );
    Ok(EnvFileStatus::Created)
}

/// Load `<dir>/.env` into the process environment if it exists
pub fn load_env_file(dir: &Path) -> Result<bool> {
    let env_path = env_file(dir);
    if !env_path.exists() {
        return Ok(false);
    }
    dotenvy::from_path(&env_path)?;
    Ok(true)
}

/// Required variables that are unset or empty
pub fn missing_required<F>(lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    REQUIRED_VARS
        .iter()
        .filter(|key| lookup(key).map(|v| v.is_empty()).unwrap_or(true))
        .map(|key| key.to_string())
        .collect()
}

pub fn check_required<F>(lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let missing = missing_required(lookup);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingEnv(missing))
    }
}
