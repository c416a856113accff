//! Storefront page flows
//!
//! `Storefront` bundles a page with the harness configuration and exposes the
//! site-level steps scenarios are written in: navigation, login, cart and the
//! interstitial handling that precedes all of them.

use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use storefront_common::{BypassSet, Credentials, HarnessConfig};

use crate::error::E2eResult;
use crate::expect::{expect, expect_url, Expect};
use crate::interstitial::{Interstitial, InterstitialResolver, ResolutionReport};
use crate::locator::{Locator, TextMatch};
use crate::page::{BrowserPage, Viewport};

/// Login and cart checks wait longer than ordinary assertions
const SLOW_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Locators for the storefront's theme
pub mod selectors {
    use crate::locator::{Locator, TextMatch};

    pub const LOGIN_NAME: &str = "login|accedi|sign in";
    pub const LOGIN_FAILURE_TEXT: &str =
        r"(La tua autenticazione non è riuscita\.|Authentication failed\.)";

    pub fn login_link() -> Locator {
        Locator::role_named("link", TextMatch::regex_i(LOGIN_NAME))
    }

    pub fn email_input() -> Locator {
        Locator::role_named("textbox", TextMatch::regex_i("email|e-mail"))
    }

    pub fn password_input() -> Locator {
        Locator::role_named("textbox", TextMatch::regex_i("password|parola"))
    }

    pub fn login_button() -> Locator {
        Locator::role_named("button", TextMatch::regex_i(LOGIN_NAME))
    }

    pub fn logout_link() -> Locator {
        Locator::role_named("link", TextMatch::regex_i("logout|esci"))
    }

    /// Any link that only shows for a signed-in customer
    pub fn account_link() -> Locator {
        Locator::role_named("link", TextMatch::regex_i("logout|esci|account|profilo"))
    }

    pub fn header_account() -> Locator {
        Locator::css("a.account")
    }

    /// Sign-out entry on the account page (the second such link)
    pub fn account_page_sign_out() -> Locator {
        Locator::role_named("link", TextMatch::regex_i("logout|esci|sign out")).nth(1)
    }

    pub fn login_error() -> Locator {
        Locator::css(".alert-danger")
    }

    pub fn authentication_page() -> Locator {
        Locator::css("body#authentication")
    }

    pub fn home_page() -> Locator {
        Locator::css("body#index")
    }

    pub fn search_page() -> Locator {
        Locator::css("body#search")
    }

    /// Quick-view button of the first product in the home page carousels
    pub fn quick_view() -> Locator {
        Locator::role("listitem")
            .filter_text(TextMatch::regex_i("La novità|Anteprima"))
            .get_by_role("button", None)
            .first()
    }

    pub fn add_to_cart() -> Locator {
        Locator::role_named("button", TextMatch::regex_i("Aggiungi al carrello|Add to cart"))
    }

    pub fn continue_shopping() -> Locator {
        Locator::role_named("button", TextMatch::regex_i("Continua lo shopping|Continue shopping"))
    }

    pub fn proceed_to_checkout() -> Locator {
        Locator::role_named("link", TextMatch::regex_i("Procedi con il checkout|Proceed to checkout"))
    }

    pub fn cart_button() -> Locator {
        Locator::css("#tvcms_cart_button")
    }

    pub fn cart_products() -> Locator {
        Locator::css(".tvcart-product-wrapper")
    }

    pub fn cart_icon() -> Locator {
        Locator::css(".tvshopping-cart-icon a")
    }
}

/// A page on the storefront plus everything needed to drive it
#[derive(Clone)]
pub struct Storefront {
    page: Arc<dyn BrowserPage>,
    config: Arc<HarnessConfig>,
    resolver: InterstitialResolver,
}

impl Storefront {
    pub fn new(page: Arc<dyn BrowserPage>, config: Arc<HarnessConfig>) -> Self {
        let resolver = InterstitialResolver::new(&config.timeouts);
        Self {
            page,
            config,
            resolver,
        }
    }

    pub fn page(&self) -> &dyn BrowserPage {
        self.page.as_ref()
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.config.credentials
    }

    pub fn resolver(&self) -> &InterstitialResolver {
        &self.resolver
    }

    /// Assertion using the configured timeout and poll interval
    pub fn expect(&self, locator: Locator) -> Expect<'_> {
        expect(self.page(), locator)
            .timeout(self.config.timeouts.assertion())
            .poll_interval(self.config.timeouts.poll_interval())
    }

    /// Absolute URL for a site path
    pub fn url(&self, path: &str) -> String {
        self.config.url(path)
    }

    /// Put the bypass tokens in the cookie jar; must precede navigation
    pub async fn seed_bypass_cookies(&self, bypass: &BypassSet) -> E2eResult<()> {
        if bypass.is_empty() {
            return Ok(());
        }
        debug!("Seeding {} bypass cookie(s)", bypass.len());
        self.page
            .add_cookies(&bypass.to_cookies(&self.config.site.cookie_domain))
            .await
    }

    pub async fn go_to_homepage(&self) -> E2eResult<()> {
        let url = self.url("/");
        info!("Opening {}", url);
        self.page.goto(&url).await
    }

    /// Standard bootstrap: seed every known token, load home, clear popups
    pub async fn setup_test(&self) -> E2eResult<ResolutionReport> {
        let bypass = BypassSet::all_known();
        self.seed_bypass_cookies(&bypass).await?;
        self.go_to_homepage().await?;
        self.resolver.ensure_clear_page(self.page(), &bypass).await
    }

    pub async fn ensure_clear_page(&self, bypass: &BypassSet) -> E2eResult<ResolutionReport> {
        self.resolver.ensure_clear_page(self.page(), bypass).await
    }

    pub async fn go_to_login_page(&self) -> E2eResult<()> {
        self.page.click(&selectors::login_link().first()).await?;
        let login = Regex::new(r"(?i)/login")?;
        expect_url(self.page(), &login, self.config.timeouts.assertion()).await
    }

    pub async fn fill_login_form(&self, email: &str, password: &str) -> E2eResult<()> {
        self.page.fill(&selectors::email_input(), email).await?;
        self.page.fill(&selectors::password_input(), password).await
    }

    /// Fill the login form with the configured test account
    pub async fn fill_default_login_form(&self) -> E2eResult<()> {
        let credentials = self.credentials().clone();
        self.fill_login_form(&credentials.email, &credentials.password).await
    }

    pub async fn submit_login_form(&self) -> E2eResult<()> {
        self.page.click(&selectors::login_button()).await
    }

    pub async fn login_with(&self, email: &str, password: &str) -> E2eResult<()> {
        info!("Logging in as {}", email);
        self.go_to_login_page().await?;
        self.fill_login_form(email, password).await?;
        self.submit_login_form().await
    }

    /// Log in with the configured test account
    pub async fn login(&self) -> E2eResult<()> {
        let credentials = self.credentials().clone();
        self.login_with(&credentials.email, &credentials.password).await
    }

    pub async fn verify_login_success(&self) -> E2eResult<()> {
        self.expect(selectors::account_link())
            .timeout(SLOW_CHECK_TIMEOUT)
            .to_be_visible()
            .await
    }

    pub async fn verify_login_failure(&self) -> E2eResult<()> {
        self.expect(selectors::login_error()).to_be_visible().await?;
        self.expect(selectors::login_error())
            .to_contain_text(TextMatch::regex_i(selectors::LOGIN_FAILURE_TEXT))
            .await
    }

    pub async fn logout_via_header(&self) -> E2eResult<()> {
        self.page.click(&selectors::logout_link().first()).await
    }

    pub async fn logout_via_account_page(&self) -> E2eResult<()> {
        self.page.click(&selectors::header_account().first()).await?;
        self.page.click(&selectors::account_page_sign_out()).await
    }

    pub async fn verify_logout_success(&self) -> E2eResult<()> {
        self.expect(selectors::login_link()).to_be_visible().await
    }

    pub async fn verify_authentication_page(&self) -> E2eResult<()> {
        self.expect(selectors::authentication_page()).to_be_visible().await
    }

    pub async fn verify_home_page(&self) -> E2eResult<()> {
        self.expect(selectors::home_page()).to_be_visible().await
    }

    pub async fn verify_search_page(&self) -> E2eResult<()> {
        self.expect(selectors::search_page()).to_be_visible().await
    }

    /// Add the first featured product through its quick view
    pub async fn add_item_to_cart(&self) -> E2eResult<()> {
        self.open_quick_view_and_add().await?;
        self.page.click(&selectors::continue_shopping()).await
    }

    pub async fn add_item_to_cart_and_checkout(&self) -> E2eResult<()> {
        self.open_quick_view_and_add().await?;
        self.page.click(&selectors::proceed_to_checkout()).await
    }

    async fn open_quick_view_and_add(&self) -> E2eResult<()> {
        self.page.click(&selectors::quick_view()).await?;
        self.page.click(&selectors::add_to_cart()).await
    }

    pub async fn verify_cart_has_items(&self) -> E2eResult<()> {
        self.page.hover(&selectors::cart_button()).await?;
        self.expect(selectors::cart_products())
            .timeout(SLOW_CHECK_TIMEOUT)
            .to_be_visible()
            .await
    }

    pub async fn handle_age_verification(&self) -> E2eResult<bool> {
        self.resolver.handle(self.page(), Interstitial::AgeGate).await
    }

    pub async fn handle_cookie_consent(&self) -> E2eResult<bool> {
        self.resolver.handle(self.page(), Interstitial::CookieConsent).await
    }

    pub async fn handle_mailchimp_popup(&self) -> E2eResult<bool> {
        self.resolver.handle(self.page(), Interstitial::NewsletterPopup).await
    }

    pub async fn set_mobile_viewport(&self) -> E2eResult<()> {
        self.page.set_viewport(Viewport::MOBILE).await
    }

    pub async fn scroll_to_bottom(&self) -> E2eResult<()> {
        self.page
            .evaluate(None, "() => window.scrollTo(0, document.body.scrollHeight)")
            .await?;
        Ok(())
    }
}
