//! Interstitial resolution against the scripted storefront

mod common;

use std::time::Duration;
use test_case::test_case;
use tokio::time::Instant;

use storefront_common::{BypassSet, BypassToken, TimeoutConfig};
use storefront_e2e::{
    expect, BrowserPage, E2eError, Interstitial, InterstitialResolver, InterstitialSpec,
    InterstitialState, Outcome,
};

use common::{Action, FakeOptions, FakeStorefront};

const DOMAIN: &str = "vapeinitaly.com";
const HOME: &str = "https://vapeinitaly.com/";

fn resolver() -> InterstitialResolver {
    InterstitialResolver::new(&TimeoutConfig::default())
}

fn bypass(age: bool, mailchimp: bool) -> BypassSet {
    let mut set = BypassSet::none();
    if age {
        set.insert(BypassToken::age_verification());
    }
    if mailchimp {
        set.insert(BypassToken::mailchimp_closed());
    }
    set
}

/// Seed cookies, then navigate
async fn open(site: &FakeStorefront, set: &BypassSet) {
    site.add_cookies(&set.to_cookies(DOMAIN)).await.unwrap();
    site.goto(HOME).await.unwrap();
}

#[test_case(false, false ; "no tokens")]
#[test_case(true, false ; "age token only")]
#[test_case(false, true ; "mailchimp token only")]
#[test_case(true, true ; "both tokens")]
#[tokio::test(start_paused = true)]
async fn test_every_bypass_subset_ends_clear(age: bool, mailchimp: bool) {
    let site = FakeStorefront::new();
    let set = bypass(age, mailchimp);
    open(&site, &set).await;

    let report = resolver().ensure_clear_page(site.as_ref(), &set).await.unwrap();

    assert!(report.is_clear());
    assert_eq!(report.state, InterstitialState::Clear);
    for interstitial in Interstitial::ORDER {
        assert!(!site.showing(interstitial), "{} still showing", interstitial);
    }

    // Bypassed popups are never touched
    assert_eq!(site.clicked(Interstitial::AgeGate), !age);
    assert_eq!(site.clicked(Interstitial::NewsletterPopup), !mailchimp);
    assert_eq!(site.pointer_moves(), usize::from(!mailchimp));

    let expected = |bypassed: bool| if bypassed { Outcome::Bypassed } else { Outcome::Dismissed };
    assert_eq!(report.outcome(Interstitial::AgeGate), Some(expected(age)));
    assert_eq!(report.outcome(Interstitial::CookieConsent), Some(Outcome::Dismissed));
    assert_eq!(report.outcome(Interstitial::NewsletterPopup), Some(expected(mailchimp)));
}

#[tokio::test(start_paused = true)]
async fn test_second_pass_is_a_no_op() {
    let site = FakeStorefront::new();
    let set = BypassSet::all_known();
    open(&site, &set).await;

    let resolver = resolver();
    resolver.ensure_clear_page(site.as_ref(), &set).await.unwrap();
    let clicks = site.clicks().len();

    let report = resolver.ensure_clear_page(site.as_ref(), &set).await.unwrap();
    assert_eq!(site.clicks().len(), clicks);
    assert!(report.dismissed().is_empty());
    assert_eq!(report.outcome(Interstitial::CookieConsent), Some(Outcome::Absent));
}

#[tokio::test(start_paused = true)]
async fn test_second_pass_without_tokens_is_a_no_op() {
    let site = FakeStorefront::new();
    let set = BypassSet::none();
    open(&site, &set).await;

    let resolver = resolver();
    resolver.ensure_clear_page(site.as_ref(), &set).await.unwrap();
    let clicks = site.clicks().len();
    assert_eq!(clicks, 3);

    let report = resolver.ensure_clear_page(site.as_ref(), &set).await.unwrap();
    assert_eq!(site.clicks().len(), clicks);
    for interstitial in Interstitial::ORDER {
        assert_eq!(report.outcome(interstitial), Some(Outcome::Absent));
    }
    assert!(report.is_clear());
}

#[tokio::test(start_paused = true)]
async fn test_popups_resolve_in_order() {
    let site = FakeStorefront::new();
    let set = BypassSet::none();
    open(&site, &set).await;

    // The banner waits for the age gate
    assert!(site.showing(Interstitial::AgeGate));
    assert!(!site.showing(Interstitial::CookieConsent));

    resolver().ensure_clear_page(site.as_ref(), &set).await.unwrap();

    let markers = site.markers();
    let expected: Vec<_> = Interstitial::ORDER
        .into_iter()
        .map(|i| markers.dismiss(i).clone())
        .collect();
    assert_eq!(site.clicks(), expected);

    // The pointer only moves once the first two popups are gone
    let actions = site.actions();
    let moved = actions.iter().position(|a| *a == Action::MouseMove).unwrap();
    let banner_click = actions
        .iter()
        .position(|a| *a == Action::Click(markers.dismiss(Interstitial::CookieConsent).clone()))
        .unwrap();
    assert!(banner_click < moved);
}

#[tokio::test(start_paused = true)]
async fn test_accepting_age_gate_reveals_cookie_banner() {
    let site = FakeStorefront::new();
    open(&site, &BypassSet::none()).await;
    let markers = site.markers().clone();

    expect(site.as_ref(), markers.age.marker.clone()).to_be_visible().await.unwrap();

    assert!(resolver().handle(site.as_ref(), Interstitial::AgeGate).await.unwrap());

    expect(site.as_ref(), markers.age.marker.clone()).to_be_hidden().await.unwrap();
    expect(site.as_ref(), markers.cookie.marker.clone()).to_be_visible().await.unwrap();
    expect(site.as_ref(), markers.age.marker.clone()).to_have_count(0).await.unwrap();
    expect(site.as_ref(), markers.cookie.marker.clone()).to_have_count(1).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_age_token_suppresses_gate() {
    let site = FakeStorefront::new();
    open(&site, &bypass(true, false)).await;
    site.mouse_move(0.0, 0.0).await.unwrap();

    let gate = site.markers().age.marker.clone();
    expect(site.as_ref(), gate).to_be_hidden().await.unwrap();
    assert!(!site.showing(Interstitial::AgeGate));
}

#[tokio::test(start_paused = true)]
async fn test_both_tokens_survive_reload() {
    let site = FakeStorefront::new();
    let set = BypassSet::all_known();
    open(&site, &set).await;
    site.reload().await.unwrap();

    let resolver = resolver();
    let report = resolver.ensure_clear_page(site.as_ref(), &set).await.unwrap();

    assert_eq!(report.outcome(Interstitial::AgeGate), Some(Outcome::Bypassed));
    assert_eq!(report.outcome(Interstitial::NewsletterPopup), Some(Outcome::Bypassed));
    assert!(!site.clicked(Interstitial::AgeGate));
    assert!(!site.clicked(Interstitial::NewsletterPopup));
    assert_eq!(site.pointer_moves(), 0);
    resolver.verify_clear(site.as_ref()).await.unwrap();

    // Moving the pointer afterwards still brings up nothing
    site.mouse_move(0.0, 0.0).await.unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;
    resolver.verify_clear(site.as_ref()).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_newsletter_appears_after_pointer_move() {
    let site = FakeStorefront::new();
    open(&site, &bypass(true, false)).await;
    let popup = site.markers().newsletter.marker.clone();

    site.mouse_move(0.0, 0.0).await.unwrap();
    expect(site.as_ref(), popup.clone())
        .timeout(TimeoutConfig::default().newsletter())
        .to_be_visible()
        .await
        .unwrap();

    assert!(resolver()
        .handle(site.as_ref(), Interstitial::NewsletterPopup)
        .await
        .unwrap());
    expect(site.as_ref(), popup).to_be_hidden().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_missing_newsletter_is_absent_after_full_window() {
    let site = FakeStorefront::with_options(FakeOptions {
        newsletter_delay: None,
        ..Default::default()
    });
    let set = bypass(true, false);
    open(&site, &set).await;

    let start = Instant::now();
    let report = resolver().ensure_clear_page(site.as_ref(), &set).await.unwrap();

    assert_eq!(report.outcome(Interstitial::NewsletterPopup), Some(Outcome::Absent));
    assert!(start.elapsed() >= Duration::from_secs(25));
    assert_eq!(site.pointer_moves(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_custom_newsletter_window() {
    let site = FakeStorefront::with_options(FakeOptions {
        newsletter_delay: None,
        ..Default::default()
    });
    let set = bypass(true, false);
    open(&site, &set).await;

    let timeouts = TimeoutConfig::default();
    let short = InterstitialSpec {
        probe_timeout: Duration::from_secs(2),
        ..InterstitialSpec::newsletter(&timeouts)
    };
    let resolver = resolver().with_spec(Interstitial::NewsletterPopup, short);
    assert_eq!(
        resolver.spec(Interstitial::NewsletterPopup).probe_timeout,
        Duration::from_secs(2)
    );

    let start = Instant::now();
    let report = resolver.ensure_clear_page(site.as_ref(), &set).await.unwrap();

    assert_eq!(report.outcome(Interstitial::NewsletterPopup), Some(Outcome::Absent));
    assert!(start.elapsed() < Duration::from_secs(25));
}

#[tokio::test(start_paused = true)]
async fn test_late_newsletter_within_window_is_dismissed() {
    let site = FakeStorefront::with_options(FakeOptions {
        newsletter_delay: Some(Duration::from_secs(20)),
        ..Default::default()
    });
    let set = bypass(true, false);
    open(&site, &set).await;

    let report = resolver().ensure_clear_page(site.as_ref(), &set).await.unwrap();
    assert_eq!(report.outcome(Interstitial::NewsletterPopup), Some(Outcome::Dismissed));
}

#[tokio::test(start_paused = true)]
async fn test_stuck_popup_is_an_error() {
    let site = FakeStorefront::with_options(FakeOptions {
        stuck: Some(Interstitial::CookieConsent),
        ..Default::default()
    });
    let set = BypassSet::all_known();
    open(&site, &set).await;

    let err = resolver().ensure_clear_page(site.as_ref(), &set).await.unwrap_err();
    assert!(matches!(err, E2eError::InterstitialStillVisible(Interstitial::CookieConsent)));
}

#[tokio::test(start_paused = true)]
async fn test_driver_errors_propagate() {
    let site = FakeStorefront::with_options(FakeOptions {
        broken_driver: true,
        ..Default::default()
    });
    let set = BypassSet::none();
    open(&site, &set).await;

    let err = resolver().ensure_clear_page(site.as_ref(), &set).await.unwrap_err();
    assert!(matches!(err, E2eError::Driver(_)));
    assert!(site.clicks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_handle_skips_hidden_controls() {
    let site = FakeStorefront::new();
    open(&site, &BypassSet::all_known()).await;

    let resolver = resolver();
    assert!(!resolver.handle(site.as_ref(), Interstitial::AgeGate).await.unwrap());
    assert!(!resolver
        .handle(site.as_ref(), Interstitial::NewsletterPopup)
        .await
        .unwrap());
    assert!(site.clicks().is_empty());
}
