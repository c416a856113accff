//! Scripted in-memory storefront used by the integration tests
//!
//! Models the popup behaviour of the live site:
//! - the age gate shows unless `an_age_verification` is in the cookie jar
//! - the cookie banner only renders once the age gate is gone
//! - the newsletter popup appears a few seconds after the first pointer move,
//!   unless `MCPopupClosed` is set

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use storefront_common::{HarnessConfig, TimeoutConfig, AGE_VERIFICATION_COOKIE, MAILCHIMP_CLOSED_COOKIE};
use storefront_e2e::interstitial::InterstitialSpec;
use storefront_e2e::{
    BrowserLauncher, BrowserPage, Cookie, E2eError, E2eResult, Interstitial, Locator, Viewport,
    WaitState,
};

/// Consent cookie written when the banner is accepted
pub const CONSENT_COOKIE: &str = "__lglaw";

const POLL: Duration = Duration::from_millis(50);

/// Locators the fake knows how to render
#[derive(Debug, Clone)]
pub struct Markers {
    pub age: InterstitialSpec,
    pub cookie: InterstitialSpec,
    pub newsletter: InterstitialSpec,
}

impl Markers {
    pub fn new() -> Self {
        let timeouts = TimeoutConfig::default();
        Self {
            age: InterstitialSpec::age_gate(&timeouts),
            cookie: InterstitialSpec::cookie_consent(&timeouts),
            newsletter: InterstitialSpec::newsletter(&timeouts),
        }
    }

    pub fn marker(&self, interstitial: Interstitial) -> &Locator {
        match interstitial {
            Interstitial::AgeGate => &self.age.marker,
            Interstitial::CookieConsent => &self.cookie.marker,
            Interstitial::NewsletterPopup => &self.newsletter.marker,
        }
    }

    pub fn dismiss(&self, interstitial: Interstitial) -> &Locator {
        match interstitial {
            Interstitial::AgeGate => &self.age.dismiss,
            Interstitial::CookieConsent => &self.cookie.dismiss,
            Interstitial::NewsletterPopup => &self.newsletter.dismiss,
        }
    }
}

/// Knobs for misbehaving sites
#[derive(Debug, Clone)]
pub struct FakeOptions {
    /// Delay between the first pointer move and the newsletter popup;
    /// `None` means the popup never loads
    pub newsletter_delay: Option<Duration>,
    /// Popup whose dismiss control does nothing
    pub stuck: Option<Interstitial>,
    /// Every wait fails with a driver error
    pub broken_driver: bool,
}

impl Default for FakeOptions {
    fn default() -> Self {
        Self {
            newsletter_delay: Some(Duration::from_secs(3)),
            stuck: None,
            broken_driver: false,
        }
    }
}

#[derive(Debug, Default)]
struct SiteState {
    url: String,
    cookies: Vec<Cookie>,
    loaded: bool,
    age_gate: bool,
    banner: bool,
    pointer_moved_at: Option<Instant>,
    newsletter_closed: bool,
    viewport: Option<Viewport>,
    closed: bool,
}

impl SiteState {
    fn has_cookie(&self, name: &str) -> bool {
        self.cookies.iter().any(|c| c.name == name)
    }
}

/// Page action as recorded by the fake
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Goto(String),
    Reload,
    Click(Locator),
    MouseMove,
}

pub struct FakeStorefront {
    markers: Markers,
    options: FakeOptions,
    state: Mutex<SiteState>,
    log: Mutex<Vec<Action>>,
}

impl FakeStorefront {
    pub fn new() -> Arc<Self> {
        Self::with_options(FakeOptions::default())
    }

    pub fn with_options(options: FakeOptions) -> Arc<Self> {
        Arc::new(Self {
            markers: Markers::new(),
            options,
            state: Mutex::new(SiteState::default()),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn actions(&self) -> Vec<Action> {
        self.log.lock().clone()
    }

    pub fn clicks(&self) -> Vec<Locator> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Click(locator) => Some(locator),
                _ => None,
            })
            .collect()
    }

    pub fn clicked(&self, interstitial: Interstitial) -> bool {
        let dismiss = self.markers.dismiss(interstitial);
        self.clicks().iter().any(|l| l == dismiss)
    }

    pub fn pointer_moves(&self) -> usize {
        self.actions()
            .iter()
            .filter(|a| **a == Action::MouseMove)
            .count()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.state.lock().viewport
    }

    /// Is the popup rendered right now
    pub fn showing(&self, interstitial: Interstitial) -> bool {
        let state = self.state.lock();
        self.showing_locked(&state, interstitial)
    }

    fn showing_locked(&self, state: &SiteState, interstitial: Interstitial) -> bool {
        if !state.loaded {
            return false;
        }
        match interstitial {
            Interstitial::AgeGate => state.age_gate,
            Interstitial::CookieConsent => state.banner,
            Interstitial::NewsletterPopup => {
                if state.newsletter_closed || state.has_cookie(MAILCHIMP_CLOSED_COOKIE) {
                    return false;
                }
                match (state.pointer_moved_at, self.options.newsletter_delay) {
                    (Some(moved), Some(delay)) => Instant::now() >= moved + delay,
                    _ => false,
                }
            }
        }
    }

    fn visible(&self, locator: &Locator) -> bool {
        let state = self.state.lock();
        Interstitial::ORDER.into_iter().any(|i| {
            (locator == self.markers.marker(i) || locator == self.markers.dismiss(i))
                && self.showing_locked(&state, i)
        })
    }

    fn load(&self, url: Option<&str>) {
        let mut state = self.state.lock();
        if let Some(url) = url {
            state.url = url.to_string();
        }
        state.loaded = true;
        state.age_gate = !state.has_cookie(AGE_VERIFICATION_COOKIE);
        state.banner = !state.age_gate && !state.has_cookie(CONSENT_COOKIE);
        state.pointer_moved_at = None;
        state.newsletter_closed = false;
    }

    fn set_cookie(state: &mut SiteState, name: &str, value: &str) {
        state.cookies.retain(|c| c.name != name);
        state.cookies.push(Cookie {
            name: name.to_string(),
            value: value.to_string(),
            domain: "vapeinitaly.com".to_string(),
            path: "/".to_string(),
        });
    }

    fn dismiss(&self, interstitial: Interstitial) {
        if self.options.stuck == Some(interstitial) {
            return;
        }
        let mut state = self.state.lock();
        match interstitial {
            Interstitial::AgeGate => {
                state.age_gate = false;
                Self::set_cookie(&mut state, AGE_VERIFICATION_COOKIE, "1");
                state.banner = !state.has_cookie(CONSENT_COOKIE);
            }
            Interstitial::CookieConsent => {
                state.banner = false;
                Self::set_cookie(&mut state, CONSENT_COOKIE, "1");
            }
            Interstitial::NewsletterPopup => {
                state.newsletter_closed = true;
                Self::set_cookie(&mut state, MAILCHIMP_CLOSED_COOKIE, "yes");
            }
        }
    }

    fn record(&self, action: Action) {
        self.log.lock().push(action);
    }
}

#[async_trait]
impl BrowserPage for FakeStorefront {
    async fn add_cookies(&self, cookies: &[Cookie]) -> E2eResult<()> {
        let mut state = self.state.lock();
        for cookie in cookies {
            Self::set_cookie(&mut state, &cookie.name, &cookie.value);
        }
        Ok(())
    }

    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.record(Action::Goto(url.to_string()));
        self.load(Some(url));
        Ok(())
    }

    async fn reload(&self) -> E2eResult<()> {
        self.record(Action::Reload);
        self.load(None);
        Ok(())
    }

    async fn url(&self) -> E2eResult<String> {
        Ok(self.state.lock().url.clone())
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        Ok(self.visible(locator))
    }

    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()> {
        if self.options.broken_driver {
            return Err(E2eError::Driver("Target page, context or browser has been closed".to_string()));
        }
        let deadline = Instant::now() + timeout;
        loop {
            let visible = self.visible(locator);
            let reached = match state {
                WaitState::Visible | WaitState::Attached => visible,
                WaitState::Hidden | WaitState::Detached => !visible,
            };
            if reached {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(E2eError::Timeout(format!("{} to be {}", locator, state.as_str())));
            }
            sleep(POLL).await;
        }
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        let target = Interstitial::ORDER
            .into_iter()
            .find(|i| locator == self.markers.dismiss(*i) && self.showing(*i));
        match target {
            Some(interstitial) => {
                self.record(Action::Click(locator.clone()));
                self.dismiss(interstitial);
                Ok(())
            }
            None => Err(E2eError::Timeout(format!("{} to be visible", locator))),
        }
    }

    async fn fill(&self, locator: &Locator, _value: &str) -> E2eResult<()> {
        Err(E2eError::Timeout(format!("{} to be editable", locator)))
    }

    async fn press(&self, locator: &Locator, _key: &str) -> E2eResult<()> {
        Err(E2eError::Timeout(format!("{} to be visible", locator)))
    }

    async fn hover(&self, locator: &Locator) -> E2eResult<()> {
        Err(E2eError::Timeout(format!("{} to be visible", locator)))
    }

    async fn mouse_move(&self, _x: f64, _y: f64) -> E2eResult<()> {
        self.record(Action::MouseMove);
        let mut state = self.state.lock();
        if state.pointer_moved_at.is_none() {
            state.pointer_moved_at = Some(Instant::now());
        }
        Ok(())
    }

    async fn attribute(&self, _locator: &Locator, _name: &str) -> E2eResult<Option<String>> {
        Ok(None)
    }

    async fn is_enabled(&self, _locator: &Locator) -> E2eResult<bool> {
        Ok(true)
    }

    async fn text_content(&self, _locator: &Locator) -> E2eResult<Option<String>> {
        Ok(None)
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        Ok(usize::from(self.visible(locator)))
    }

    async fn evaluate(&self, _target: Option<&Locator>, _function: &str) -> E2eResult<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    async fn aria_snapshot(&self, locator: &Locator) -> E2eResult<String> {
        Err(E2eError::Timeout(format!("{} to be attached", locator)))
    }

    async fn set_viewport(&self, viewport: Viewport) -> E2eResult<()> {
        self.state.lock().viewport = Some(viewport);
        Ok(())
    }

    async fn screenshot(&self, path: &Path, _full_page: bool) -> E2eResult<()> {
        std::fs::write(path, b"\x89PNG\r\n\x1a\n")?;
        Ok(())
    }

    async fn close(&self) -> E2eResult<()> {
        self.state.lock().closed = true;
        Ok(())
    }
}

/// Hands out a fresh `FakeStorefront` per launch and keeps them for inspection
#[derive(Default)]
pub struct FakeLauncher {
    options: FakeOptions,
    pages: Mutex<Vec<Arc<FakeStorefront>>>,
}

impl FakeLauncher {
    pub fn new(options: FakeOptions) -> Arc<Self> {
        Arc::new(Self {
            options,
            pages: Mutex::new(Vec::new()),
        })
    }

    pub fn pages(&self) -> Vec<Arc<FakeStorefront>> {
        self.pages.lock().clone()
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> E2eResult<Arc<dyn BrowserPage>> {
        let page = FakeStorefront::with_options(self.options.clone());
        self.pages.lock().push(page.clone());
        Ok(page)
    }
}

/// Default configuration with results going to `output_dir`
pub fn test_config(output_dir: &Path) -> Arc<HarnessConfig> {
    let mut config = HarnessConfig::default();
    config.runner.output_dir = output_dir.to_path_buf();
    Arc::new(config)
}
