//! CLI Commands

pub mod env;
pub mod list;
pub mod preflight;
pub mod run;

use anyhow::Context;
use std::path::Path;
use tracing::debug;

use storefront_common::HarnessConfig;

/// Load `.env` from the working directory, then the layered configuration
pub fn load_config(path: Option<&Path>) -> anyhow::Result<HarnessConfig> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    if storefront_common::env::load_env_file(&cwd)? {
        debug!("Loaded {}", storefront_common::env::env_file(&cwd).display());
    }
    let config = HarnessConfig::load(path).context("failed to load harness configuration")?;
    Ok(config)
}
