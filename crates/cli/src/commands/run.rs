//! Run scenarios against the live storefront

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use storefront_common::{env, BrowserEngine, HarnessConfig};
use storefront_e2e::{PlaywrightConfig, PlaywrightLauncher, ScenarioFilter, Suite, TestRunner};

use crate::output::{print_suite, print_warning, OutputFormat};

/// Scenario selection shared by `run` and `list`
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Only this suite (sanity, functional, regression)
    #[arg(short, long)]
    pub suite: Option<Suite>,

    /// Only scenarios carrying one of these tags
    #[arg(short, long)]
    pub tag: Vec<String>,

    /// Only these scenarios (id or group/id)
    #[arg(long)]
    pub id: Vec<String>,
}

impl From<FilterArgs> for ScenarioFilter {
    fn from(args: FilterArgs) -> Self {
        ScenarioFilter {
            suite: args.suite,
            tags: args.tag,
            ids: args.id,
        }
    }
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Concurrent browser contexts
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Browser engine (chromium, firefox, webkit)
    #[arg(long)]
    pub browser: Option<BrowserEngine>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Directory for results and failure screenshots
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the HTTP reachability check
    #[arg(long)]
    pub skip_preflight: bool,
}

impl RunArgs {
    /// Command-line flags win over file and environment settings
    pub fn apply(&self, config: &mut HarnessConfig) {
        if let Some(workers) = self.workers {
            config.runner.workers = workers;
        }
        if let Some(browser) = self.browser {
            config.browser.engine = browser;
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(output) = &self.output {
            config.runner.output_dir = output.clone();
        }
    }
}

/// Returns whether every scenario passed
pub async fn execute(args: RunArgs, mut config: HarnessConfig, format: OutputFormat) -> anyhow::Result<bool> {
    args.apply(&mut config);
    config.validate()?;

    let missing = env::missing_required(|key| std::env::var(key).ok());
    if !missing.is_empty() {
        print_warning(&format!(
            "{} not set; login scenarios use the default test account",
            missing.join(", ")
        ));
    }

    let config = Arc::new(config);
    let launcher = Arc::new(PlaywrightLauncher::new(PlaywrightConfig::from_harness(&config)));
    let runner = TestRunner::new(launcher, config.clone());

    if !args.skip_preflight {
        runner.preflight().await.context("preflight failed")?;
    }

    info!(
        "Running against {} with {} ({})",
        config.site.base_url,
        config.browser.engine,
        if config.browser.headless { "headless" } else { "headed" }
    );

    let results = runner.run(&args.filter.into()).await?;
    runner.write_results(&results)?;
    print_suite(&results, format);

    Ok(results.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = RunArgs {
            filter: FilterArgs::default(),
            workers: Some(4),
            browser: Some(BrowserEngine::Firefox),
            headed: true,
            output: Some(PathBuf::from("out")),
            skip_preflight: false,
        };
        let mut config = HarnessConfig::default();
        args.apply(&mut config);

        assert_eq!(config.runner.workers, 4);
        assert_eq!(config.browser.engine, BrowserEngine::Firefox);
        assert!(!config.browser.headless);
        assert_eq!(config.runner.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_filter_args_convert() {
        let filter: ScenarioFilter = FilterArgs {
            suite: Some(Suite::Functional),
            tag: vec!["logout".to_string()],
            id: Vec::new(),
        }
        .into();
        assert_eq!(filter.select().unwrap().len(), 3);
    }
}
