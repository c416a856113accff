//! Harness configuration
//!
//! Configuration is resolved once at startup and passed explicitly into the
//! harness. Layering: built-in defaults, then an optional TOML file, then
//! environment variables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

pub const ENV_BASE_URL: &str = "STOREFRONT_BASE_URL";
pub const ENV_COOKIE_DOMAIN: &str = "STOREFRONT_COOKIE_DOMAIN";
pub const ENV_BROWSER: &str = "STOREFRONT_BROWSER";
pub const ENV_HEADLESS: &str = "STOREFRONT_HEADLESS";
pub const ENV_OUTPUT_DIR: &str = "STOREFRONT_OUTPUT_DIR";
pub const ENV_WORKERS: &str = "STOREFRONT_WORKERS";
pub const ENV_USER_EMAIL: &str = "TEST_USER_EMAIL";
pub const ENV_USER_PASSWORD: &str = "TEST_USER_PASSWORD";

/// Complete harness configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Site under test
    pub site: SiteConfig,

    /// Browser launch settings
    pub browser: BrowserConfig,

    /// Poll windows and assertion timeouts
    pub timeouts: TimeoutConfig,

    /// Runner settings
    pub runner: RunnerSettings,

    /// Login credentials
    pub credentials: Credentials,
}

impl HarnessConfig {
    /// Load configuration from an optional TOML file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override fields from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.site.base_url = url;
        }
        if let Some(domain) = lookup(ENV_COOKIE_DOMAIN) {
            self.site.cookie_domain = domain;
        }
        if let Some(engine) = lookup(ENV_BROWSER) {
            self.browser.engine = engine.parse()?;
        }
        if let Some(headless) = lookup(ENV_HEADLESS) {
            self.browser.headless = parse_bool(ENV_HEADLESS, &headless)?;
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.runner.output_dir = PathBuf::from(dir);
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            self.runner.workers = workers.parse().map_err(|_| Error::InvalidEnvValue {
                key: ENV_WORKERS.to_string(),
                value: workers.clone(),
            })?;
        }
        if let Some(email) = lookup(ENV_USER_EMAIL).filter(|v| !v.is_empty()) {
            self.credentials.email = email;
        }
        if let Some(password) = lookup(ENV_USER_PASSWORD).filter(|v| !v.is_empty()) {
            self.credentials.password = password;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.site.base_url.starts_with("http://") || self.site.base_url.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.site.base_url
            )));
        }
        if self.site.cookie_domain.is_empty() {
            return Err(Error::InvalidConfig("cookie_domain must not be empty".to_string()));
        }
        if self.runner.workers == 0 {
            return Err(Error::InvalidConfig("workers must be at least 1".to_string()));
        }
        if self.browser.viewport_width == 0 || self.browser.viewport_height == 0 {
            return Err(Error::InvalidConfig("viewport dimensions must be non-zero".to_string()));
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig("poll_interval_ms must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Resolve a site-relative path against the base URL
    pub fn url(&self, path: &str) -> String {
        let base = self.site.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            format!("{}/", base)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidEnvValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Site under test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Storefront homepage
    pub base_url: String,

    /// Domain used when seeding bypass cookies
    pub cookie_domain: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://vapeinitaly.com/".to_string(),
            cookie_domain: "vapeinitaly.com".to_string(),
        }
    }
}

/// Browser engine driven by Playwright
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserEngine::Chromium => "chromium",
            BrowserEngine::Firefox => "firefox",
            BrowserEngine::Webkit => "webkit",
        }
    }
}

impl FromStr for BrowserEngine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(BrowserEngine::Chromium),
            "firefox" => Ok(BrowserEngine::Firefox),
            "webkit" | "safari" => Ok(BrowserEngine::Webkit),
            _ => Err(Error::InvalidEnvValue {
                key: ENV_BROWSER.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for BrowserEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Browser launch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub engine: BrowserEngine,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Node.js executable used to host the Playwright bridge
    pub node_binary: String,

    /// Directory whose node_modules contains `playwright` (None = cwd)
    pub driver_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            engine: BrowserEngine::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: "node".to_string(),
            driver_dir: None,
        }
    }
}

/// Poll windows and timeouts, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Probe window for the age gate and cookie banner
    pub probe_ms: u64,

    /// Probe window for the newsletter popup (loads in an async iframe)
    pub newsletter_ms: u64,

    /// Default assertion timeout
    pub assertion_ms: u64,

    /// Page navigation timeout
    pub navigation_ms: u64,

    /// Default timeout for clicks, fills and other element actions
    pub action_ms: u64,

    /// Interval between visibility polls
    pub poll_interval_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_ms: 5_000,
            newsletter_ms: 25_000,
            assertion_ms: 5_000,
            navigation_ms: 30_000,
            action_ms: 10_000,
            poll_interval_ms: 100,
        }
    }
}

impl TimeoutConfig {
    pub fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_ms)
    }

    pub fn newsletter(&self) -> Duration {
        Duration::from_millis(self.newsletter_ms)
    }

    pub fn assertion(&self) -> Duration {
        Duration::from_millis(self.assertion_ms)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Runner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Directory for results and failure screenshots
    pub output_dir: PathBuf,

    /// Scenarios run concurrently, each in its own browser context
    pub workers: usize,

    /// Capture a full-page screenshot when a scenario fails
    pub screenshot_on_failure: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("test-results"),
            workers: 1,
            screenshot_on_failure: true,
        }
    }
}

/// Login credentials for the test account
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("test@example.com", "testpassword")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
