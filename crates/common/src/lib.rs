//! Storefront E2E Common Library
//!
//! Configuration, credentials and bypass tokens shared by the harness and
//! its command-line front end.

pub mod config;
pub mod env;
pub mod error;
pub mod tokens;

// Re-export commonly used types
pub use config::{
    BrowserConfig, BrowserEngine, Credentials, HarnessConfig, RunnerSettings, SiteConfig,
    TimeoutConfig,
};
pub use error::{Error, Result};
pub use tokens::{
    BypassSet, BypassToken, SeedCookie, AGE_VERIFICATION_COOKIE, MAILCHIMP_CLOSED_COOKIE,
};

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
