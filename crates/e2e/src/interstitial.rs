//! Interstitial popup resolution
//!
//! The storefront can cover a freshly loaded page with up to three popups,
//! and they only ever render in a fixed order:
//!
//! ```text
//!   AgeGate ──> CookieConsent ──> NewsletterPopup ──> Clear
//! ```
//!
//! The cookie banner only renders once the age gate is gone, and the
//! MailChimp newsletter popup is triggered by pointer movement and loads in
//! an iframe fetched asynchronously. `InterstitialResolver` walks that state
//! machine once per call, probing each popup and dismissing it only when it is
//! actually visible. Popups whose bypass cookie was seeded are not probed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use storefront_common::{BypassSet, BypassToken, TimeoutConfig};

use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::page::{BrowserPage, WaitState};

/// Age gate headline
pub const AGE_GATE_TEXT: &str = "Sei Maggiorenne? Per";

/// Age gate acceptance link
pub const AGE_GATE_ACCEPT: &str = "Si, ho più di 18 anni";

/// Cookie banner body text
pub const COOKIE_BANNER_TEXT: &str = "Questo sito web utilizza";

/// Cookie banner accept button
pub const COOKIE_BANNER_ACCEPT: &str = "Accetto";

/// A popup that blocks interaction with the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interstitial {
    AgeGate,
    CookieConsent,
    NewsletterPopup,
}

impl Interstitial {
    /// Resolution order
    pub const ORDER: [Interstitial; 3] = [
        Interstitial::AgeGate,
        Interstitial::CookieConsent,
        Interstitial::NewsletterPopup,
    ];

    pub fn state(self) -> InterstitialState {
        match self {
            Interstitial::AgeGate => InterstitialState::AgeGate,
            Interstitial::CookieConsent => InterstitialState::CookieConsent,
            Interstitial::NewsletterPopup => InterstitialState::NewsletterPopup,
        }
    }
}

impl fmt::Display for Interstitial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Interstitial::AgeGate => "age-verification gate",
            Interstitial::CookieConsent => "cookie-consent banner",
            Interstitial::NewsletterPopup => "newsletter popup",
        })
    }
}

/// Resolver position in the popup sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterstitialState {
    AgeGate,
    CookieConsent,
    NewsletterPopup,
    Clear,
}

impl InterstitialState {
    pub fn interstitial(self) -> Option<Interstitial> {
        match self {
            InterstitialState::AgeGate => Some(Interstitial::AgeGate),
            InterstitialState::CookieConsent => Some(Interstitial::CookieConsent),
            InterstitialState::NewsletterPopup => Some(Interstitial::NewsletterPopup),
            InterstitialState::Clear => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            InterstitialState::AgeGate => InterstitialState::CookieConsent,
            InterstitialState::CookieConsent => InterstitialState::NewsletterPopup,
            InterstitialState::NewsletterPopup | InterstitialState::Clear => InterstitialState::Clear,
        }
    }
}

/// How to detect, dismiss and suppress one interstitial
#[derive(Debug, Clone)]
pub struct InterstitialSpec {
    /// Element whose visibility means the popup is showing
    pub marker: Locator,

    /// Control that closes the popup
    pub dismiss: Locator,

    /// Cookie that stops the popup from rendering
    pub bypass: Option<BypassToken>,

    /// How long to wait for the marker before treating the popup as absent
    pub probe_timeout: Duration,
}

impl InterstitialSpec {
    pub fn age_gate(timeouts: &TimeoutConfig) -> Self {
        Self {
            marker: Locator::text(AGE_GATE_TEXT),
            dismiss: Locator::role_named("link", AGE_GATE_ACCEPT),
            bypass: Some(BypassToken::age_verification()),
            probe_timeout: timeouts.probe(),
        }
    }

    pub fn cookie_consent(timeouts: &TimeoutConfig) -> Self {
        Self {
            marker: Locator::css("div").filter_text(COOKIE_BANNER_TEXT).nth(3),
            dismiss: Locator::role_named("button", COOKIE_BANNER_ACCEPT),
            bypass: None,
            probe_timeout: timeouts.probe(),
        }
    }

    pub fn newsletter(timeouts: &TimeoutConfig) -> Self {
        Self {
            marker: Locator::css("#PopupSignupForm_0 iframe")
                .nth(1)
                .content_frame()
                .locator("#SignupForm_0"),
            dismiss: Locator::role_named("button", "Close"),
            bypass: Some(BypassToken::mailchimp_closed()),
            probe_timeout: timeouts.newsletter(),
        }
    }

    fn is_bypassed(&self, bypass: &BypassSet) -> bool {
        self.bypass
            .as_ref()
            .map(|token| bypass.contains(token))
            .unwrap_or(false)
    }
}

/// What one resolution pass did with an interstitial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Its bypass cookie was seeded; not probed
    Bypassed,
    /// Seen and closed
    Dismissed,
    /// Confirmed not visible after the probe window
    Absent,
}

/// Per-interstitial outcomes of one `ensure_clear_page` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub outcomes: Vec<(Interstitial, Outcome)>,
    pub state: InterstitialState,
}

impl ResolutionReport {
    fn start() -> Self {
        Self {
            outcomes: Vec::with_capacity(Interstitial::ORDER.len()),
            state: InterstitialState::AgeGate,
        }
    }

    pub fn is_clear(&self) -> bool {
        self.state == InterstitialState::Clear
    }

    pub fn outcome(&self, interstitial: Interstitial) -> Option<Outcome> {
        self.outcomes
            .iter()
            .find(|(i, _)| *i == interstitial)
            .map(|(_, o)| *o)
    }

    /// Interstitials that were clicked away, in order
    pub fn dismissed(&self) -> Vec<Interstitial> {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == Outcome::Dismissed)
            .map(|(i, _)| *i)
            .collect()
    }
}

/// Drives a page from its first load to a popup-free state
#[derive(Debug, Clone)]
pub struct InterstitialResolver {
    age_gate: InterstitialSpec,
    cookie_consent: InterstitialSpec,
    newsletter: InterstitialSpec,
}

impl InterstitialResolver {
    /// Resolver for the storefront's own popups
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        Self {
            age_gate: InterstitialSpec::age_gate(timeouts),
            cookie_consent: InterstitialSpec::cookie_consent(timeouts),
            newsletter: InterstitialSpec::newsletter(timeouts),
        }
    }

    /// Replace how one interstitial is detected and dismissed
    pub fn with_spec(mut self, interstitial: Interstitial, spec: InterstitialSpec) -> Self {
        *self.spec_mut(interstitial) = spec;
        self
    }

    pub fn spec(&self, interstitial: Interstitial) -> &InterstitialSpec {
        match interstitial {
            Interstitial::AgeGate => &self.age_gate,
            Interstitial::CookieConsent => &self.cookie_consent,
            Interstitial::NewsletterPopup => &self.newsletter,
        }
    }

    fn spec_mut(&mut self, interstitial: Interstitial) -> &mut InterstitialSpec {
        match interstitial {
            Interstitial::AgeGate => &mut self.age_gate,
            Interstitial::CookieConsent => &mut self.cookie_consent,
            Interstitial::NewsletterPopup => &mut self.newsletter,
        }
    }

    /// Resolve every interstitial in order and verify the page is clear
    ///
    /// `bypass` must be the set of tokens that was seeded into the cookie jar
    /// before navigation. Popups that never show up within their probe window
    /// are not an error; a popup that stays visible after being dismissed is.
    pub async fn ensure_clear_page(
        &self,
        page: &dyn BrowserPage,
        bypass: &BypassSet,
    ) -> E2eResult<ResolutionReport> {
        let mut report = ResolutionReport::start();

        loop {
            let outcome = match report.state {
                InterstitialState::AgeGate => self.resolve_age_gate(page, bypass).await?,
                InterstitialState::CookieConsent => self.resolve_cookie_consent(page, bypass).await?,
                InterstitialState::NewsletterPopup => self.resolve_newsletter(page, bypass).await?,
                InterstitialState::Clear => {
                    self.verify_clear(page).await?;
                    break;
                }
            };
            if let Some(interstitial) = report.state.interstitial() {
                debug!("{}: {:?}", interstitial, outcome);
                report.outcomes.push((interstitial, outcome));
            }
            report.state = report.state.next();
        }

        info!("Page clear ({} interstitial(s) dismissed)", report.dismissed().len());
        Ok(report)
    }

    async fn resolve_age_gate(&self, page: &dyn BrowserPage, bypass: &BypassSet) -> E2eResult<Outcome> {
        self.probe_and_dismiss(page, Interstitial::AgeGate, bypass).await
    }

    async fn resolve_cookie_consent(
        &self,
        page: &dyn BrowserPage,
        bypass: &BypassSet,
    ) -> E2eResult<Outcome> {
        self.probe_and_dismiss(page, Interstitial::CookieConsent, bypass).await
    }

    async fn resolve_newsletter(&self, page: &dyn BrowserPage, bypass: &BypassSet) -> E2eResult<Outcome> {
        if self.newsletter.is_bypassed(bypass) {
            return Ok(Outcome::Bypassed);
        }
        // The popup is bound to user interaction, not page load
        page.mouse_move(0.0, 0.0).await?;
        self.probe_and_dismiss(page, Interstitial::NewsletterPopup, bypass).await
    }

    async fn probe_and_dismiss(
        &self,
        page: &dyn BrowserPage,
        interstitial: Interstitial,
        bypass: &BypassSet,
    ) -> E2eResult<Outcome> {
        let spec = self.spec(interstitial);
        if spec.is_bypassed(bypass) {
            return Ok(Outcome::Bypassed);
        }

        match page.wait_for(&spec.marker, WaitState::Visible, spec.probe_timeout).await {
            Ok(()) => {}
            Err(e) if e.is_timeout() => {
                // Only a negative check counts as absent
                if !page.is_visible(&spec.marker).await? {
                    debug!("{} not shown within {:?}", interstitial, spec.probe_timeout);
                    return Ok(Outcome::Absent);
                }
            }
            Err(e) => return Err(e),
        }

        info!("Dismissing {}", interstitial);
        if page.is_visible(&spec.dismiss).await? {
            page.click(&spec.dismiss).await?;
        }

        match page.wait_for(&spec.marker, WaitState::Hidden, spec.probe_timeout).await {
            Ok(()) => Ok(Outcome::Dismissed),
            Err(e) if e.is_timeout() => Err(E2eError::InterstitialStillVisible(interstitial)),
            Err(e) => Err(e),
        }
    }

    /// Final state: nothing may still be showing
    pub async fn verify_clear(&self, page: &dyn BrowserPage) -> E2eResult<()> {
        for interstitial in Interstitial::ORDER {
            if page.is_visible(&self.spec(interstitial).marker).await? {
                return Err(E2eError::InterstitialStillVisible(interstitial));
            }
        }
        Ok(())
    }

    /// Click an interstitial's dismiss control if it is visible right now
    ///
    /// Returns whether a click happened.
    pub async fn handle(&self, page: &dyn BrowserPage, interstitial: Interstitial) -> E2eResult<bool> {
        let dismiss = &self.spec(interstitial).dismiss;
        if page.is_visible(dismiss).await? {
            page.click(dismiss).await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
