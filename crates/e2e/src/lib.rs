//! Storefront E2E test framework
//!
//! Drives a real browser against the storefront through a Playwright bridge
//! and runs a catalogue of scenarios on top of it:
//! - Loads a page, seeds bypass cookies and resolves popups in order
//! - Exposes storefront flows (login, cart, checkout) as async helpers
//! - Auto-retrying assertions, including ARIA snapshot templates
//! - Runs scenarios with bounded concurrency and writes JSON results
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     TestRunner (Rust)                        │
//! │    ├── preflight()              HTTP reachability            │
//! │    └── run(filter) -> SuiteResult                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Scenario { id, suite, tags, bootstrap, run }                │
//! │    └── Storefront (helpers) ──> InterstitialResolver         │
//! │          AgeGate -> CookieConsent -> NewsletterPopup -> Clear│
//! ├──────────────────────────────────────────────────────────────┤
//! │  BrowserPage (trait)                                         │
//! │    └── PlaywrightHandle ── stdin/stdout JSON ──> node bridge │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod aria;
pub mod error;
pub mod expect;
pub mod interstitial;
pub mod locator;
pub mod page;
pub mod playwright;
pub mod runner;
pub mod scenarios;
pub mod storefront;

pub use error::{E2eError, E2eResult};
pub use expect::{expect, expect_url};
pub use interstitial::{
    Interstitial, InterstitialResolver, InterstitialSpec, InterstitialState, Outcome,
    ResolutionReport,
};
pub use locator::{Locator, TextMatch};
pub use page::{BrowserLauncher, BrowserPage, Cookie, Viewport, WaitState};
pub use playwright::{PlaywrightConfig, PlaywrightHandle, PlaywrightLauncher};
pub use runner::{ScenarioResult, SuiteResult, TestRunner};
pub use scenarios::{catalogue, Bootstrap, Scenario, ScenarioFilter, Seed, Suite};
pub use storefront::Storefront;
