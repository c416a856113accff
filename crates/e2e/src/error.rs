//! Error types for E2E testing

use thiserror::Error;

use crate::interstitial::Interstitial;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Driver failed to start: {0}")]
    DriverStartup(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Driver exited unexpectedly")]
    DriverClosed,

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("{0} is still visible after resolution")]
    InterstitialStillVisible(Interstitial),

    #[error("Invalid ARIA snapshot template: {0}")]
    AriaTemplate(String),

    #[error("Site preflight failed: {0}")]
    Preflight(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Config error: {0}")]
    Config(#[from] storefront_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl E2eError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, E2eError::Timeout(_))
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
