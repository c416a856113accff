//! Scenario runner: preflight, bounded concurrency, screenshots and results

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use storefront_common::HarnessConfig;

use crate::error::{E2eError, E2eResult};
use crate::page::{BrowserLauncher, BrowserPage};
use crate::scenarios::{Scenario, ScenarioFilter, Suite};
use crate::storefront::Storefront;

/// Name of the results file inside the output directory
pub const RESULTS_FILE: &str = "test-results.json";

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// `group/id`
    pub key: String,
    pub id: String,
    pub title: String,
    pub suite: Suite,
    pub success: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot: Option<PathBuf>,
}

/// Result of running a selection of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub run_id: Uuid,
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// Runs scenarios against the storefront, one fresh page each
pub struct TestRunner {
    launcher: Arc<dyn BrowserLauncher>,
    config: Arc<HarnessConfig>,
}

impl TestRunner {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: Arc<HarnessConfig>) -> Self {
        Self { launcher, config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Check the storefront answers over HTTP before starting browsers
    pub async fn preflight(&self) -> E2eResult<()> {
        let url = self.config.url("/");
        debug!("Preflight GET {}", url);

        let client = reqwest::Client::builder()
            .timeout(self.config.timeouts.navigation())
            .build()?;
        let response = client.get(&url).send().await?;
        let status = response.status();

        if status.is_success() || status.is_redirection() {
            info!("Storefront reachable at {} ({})", url, status);
            Ok(())
        } else {
            Err(E2eError::Preflight(format!("{} returned {}", url, status)))
        }
    }

    /// Run every scenario the filter selects
    pub async fn run(&self, filter: &ScenarioFilter) -> E2eResult<SuiteResult> {
        let scenarios = filter.select()?;
        Ok(self.run_scenarios(&scenarios).await)
    }

    /// Run a list of scenarios with at most `runner.workers` pages open at once
    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let workers = self.config.runner.workers.max(1);

        info!("Running {} scenario(s) with {} worker(s)...", scenarios.len(), workers);

        let results: Vec<ScenarioResult> = stream::iter(scenarios.iter().copied())
            .map(|scenario| self.run_scenario(scenario))
            .buffered(workers)
            .collect()
            .await;

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Test Results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        SuiteResult {
            run_id: Uuid::new_v4(),
            base_url: self.config.site.base_url.clone(),
            started_at,
            total: results.len(),
            passed,
            failed,
            duration_ms,
            results,
        }
    }

    /// Run one scenario in its own page; failures are captured in the result
    pub async fn run_scenario(&self, scenario: Scenario) -> ScenarioResult {
        let key = scenario.key();
        let started_at = Utc::now();
        let start = Instant::now();
        debug!("Running scenario: {}", key);

        let mut screenshot = None;
        let outcome = match self.launcher.launch().await {
            Ok(page) => {
                let site = Storefront::new(page.clone(), self.config.clone());
                let outcome = match scenario.bootstrap.prepare(&site).await {
                    Ok(()) => (scenario.run)(&site).await,
                    Err(e) => Err(e),
                };

                if outcome.is_err() && self.config.runner.screenshot_on_failure {
                    screenshot = self.capture_failure(page.as_ref(), &scenario).await;
                }
                if let Err(e) = page.close().await {
                    warn!("Failed to close page for {}: {}", key, e);
                }
                outcome
            }
            Err(e) => Err(e),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let error = match &outcome {
            Ok(()) => {
                info!("✓ {} ({} ms)", key, duration_ms);
                None
            }
            Err(e) => {
                error!("✗ {} - {}", key, e);
                Some(e.to_string())
            }
        };

        ScenarioResult {
            key,
            id: scenario.id.to_string(),
            title: scenario.title.to_string(),
            suite: scenario.suite,
            success: error.is_none(),
            started_at,
            finished_at: Utc::now(),
            duration_ms,
            error,
            screenshot,
        }
    }

    async fn capture_failure(&self, page: &dyn BrowserPage, scenario: &Scenario) -> Option<PathBuf> {
        let path = screenshot_path(&self.config.runner.output_dir, scenario);
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Cannot create {}: {}", parent.display(), e);
                return None;
            }
        }
        match page.screenshot(&path, true).await {
            Ok(()) => {
                info!("Screenshot saved: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Screenshot failed for {}: {}", scenario.key(), e);
                None
            }
        }
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        write_results(&self.config.runner.output_dir, results)
    }
}

/// Where the failure screenshot of a scenario goes
pub fn screenshot_path(output_dir: &Path, scenario: &Scenario) -> PathBuf {
    output_dir
        .join("screenshots")
        .join(format!("{}-{}.png", scenario.group, scenario.id))
}

pub fn write_results(output_dir: &Path, results: &SuiteResult) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join(RESULTS_FILE);
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}
