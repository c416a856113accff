//! Page abstraction
//!
//! `BrowserPage` is the seam between the harness and the browser-automation
//! runtime. The Playwright driver implements it for real runs; tests supply
//! scripted pages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::E2eResult;
use crate::locator::Locator;

pub use storefront_common::SeedCookie as Cookie;

/// Element state to wait for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Phone-sized viewport used by the mobile menu checks
    pub const MOBILE: Viewport = Viewport {
        width: 375,
        height: 667,
    };
}

/// A single page in an isolated browser context
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Add cookies to the page's browser context
    async fn add_cookies(&self, cookies: &[Cookie]) -> E2eResult<()>;

    async fn goto(&self, url: &str) -> E2eResult<()>;

    async fn reload(&self) -> E2eResult<()>;

    /// Current page URL
    async fn url(&self) -> E2eResult<String>;

    /// Instantaneous visibility check; a missing element is not visible
    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool>;

    /// Wait until the element reaches `state`, failing with `E2eError::Timeout`
    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()>;

    async fn click(&self, locator: &Locator) -> E2eResult<()>;

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()>;

    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()>;

    async fn hover(&self, locator: &Locator) -> E2eResult<()>;

    /// Synthetic pointer movement to viewport coordinates
    async fn mouse_move(&self, x: f64, y: f64) -> E2eResult<()>;

    async fn attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>>;

    async fn is_enabled(&self, locator: &Locator) -> E2eResult<bool>;

    /// Text content of the first match, if any
    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>>;

    async fn count(&self, locator: &Locator) -> E2eResult<usize>;

    /// Evaluate a JavaScript function on the page, or on the element when a
    /// locator is given
    async fn evaluate(&self, target: Option<&Locator>, function: &str) -> E2eResult<serde_json::Value>;

    /// ARIA snapshot (YAML) of the matched element
    async fn aria_snapshot(&self, locator: &Locator) -> E2eResult<String>;

    async fn set_viewport(&self, viewport: Viewport) -> E2eResult<()>;

    async fn screenshot(&self, path: &Path, full_page: bool) -> E2eResult<()>;

    /// Close the page and its browser context
    async fn close(&self) -> E2eResult<()>;
}

/// Creates fresh, isolated pages
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> E2eResult<Arc<dyn BrowserPage>>;
}
