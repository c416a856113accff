//! Popup sanity checks: age gate, cookie banner and MailChimp newsletter

use crate::expect::ensure;
use crate::interstitial::Interstitial;
use crate::locator::Locator;
use crate::storefront::Storefront;

use super::{Bootstrap, Scenario, ScenarioFn, ScenarioFuture, Seed, Suite};

fn age(id: &'static str, title: &'static str, seed: Seed, run: ScenarioFn) -> Scenario {
    Scenario {
        id,
        title,
        group: "age-verification",
        suite: Suite::Sanity,
        tags: &["popup", "age-verification"],
        bootstrap: Bootstrap::Fresh(seed),
        run,
    }
}

fn cookie(id: &'static str, title: &'static str, seed: Seed, run: ScenarioFn) -> Scenario {
    Scenario {
        id,
        title,
        group: "cookie-consent",
        suite: Suite::Sanity,
        tags: &["popup", "cookie-consent"],
        bootstrap: Bootstrap::Fresh(seed),
        run,
    }
}

pub(super) fn scenarios() -> Vec<Scenario> {
    vec![
        age(
            "showAgeVerificationWithMailChimp",
            "Shows Age Verification pop-up when MailChimp cookie is set",
            Seed::MailChimpClosed,
            show_age_gate,
        ),
        age(
            "clickAgeVerificationLink",
            "Can click link in Age Verification pop-up",
            Seed::MailChimpClosed,
            click_age_gate_link,
        ),
        age(
            "ageVerificationDisappearsAfterAccept",
            "Age Verification pop-up disappears after accepting",
            Seed::MailChimpClosed,
            age_gate_hides_after_accept,
        ),
        age(
            "noAgeVerificationWithCookie",
            "Does not show Age Verification pop-up if cookie is set",
            Seed::AgeVerification,
            no_age_gate_with_cookie,
        ),
        cookie(
            "cookieConsentPopup",
            "Cookie Consent pop-up appears and can be accepted",
            Seed::All,
            cookie_banner_accept,
        ),
        cookie(
            "mailChimpPopup",
            "MailChimp pop-up appears and can be closed",
            Seed::AgeVerification,
            newsletter_popup_close,
        ),
        cookie(
            "manageCookiePreferences",
            "Cookie preferences can be managed",
            Seed::All,
            manage_cookie_preferences,
        ),
        cookie(
            "allPopupsOrder",
            "All popups are handled in correct order",
            Seed::None,
            popups_in_order,
        ),
        Scenario {
            id: "mailChimpPopup",
            title: "MailChimp pop-up appears and can be closed",
            group: "mailchimp",
            suite: Suite::Sanity,
            tags: &["popup", "mailchimp"],
            bootstrap: Bootstrap::Fresh(Seed::AgeVerification),
            run: newsletter_popup_close,
        },
    ]
}

fn marker(site: &Storefront, interstitial: Interstitial) -> Locator {
    site.resolver().spec(interstitial).marker.clone()
}

fn show_age_gate(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.page().mouse_move(0.0, 0.0).await?;
        site.expect(marker(site, Interstitial::AgeGate)).to_be_visible().await
    })
}

fn click_age_gate_link(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.page().mouse_move(0.0, 0.0).await?;
        site.expect(marker(site, Interstitial::AgeGate)).to_be_visible().await?;
        let clicked = site.handle_age_verification().await?;
        ensure(clicked, "age gate accept link was not visible")
    })
}

fn age_gate_hides_after_accept(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let gate = marker(site, Interstitial::AgeGate);
        site.page().mouse_move(0.0, 0.0).await?;
        site.expect(gate.clone()).to_be_visible().await?;
        site.handle_age_verification().await?;
        site.expect(gate).to_be_hidden().await
    })
}

fn no_age_gate_with_cookie(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.page().mouse_move(0.0, 0.0).await?;
        site.expect(marker(site, Interstitial::AgeGate)).to_be_hidden().await
    })
}

fn cookie_banner_accept(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.expect(marker(site, Interstitial::CookieConsent))
            .to_be_visible()
            .await?;
        site.handle_cookie_consent().await?;
        Ok(())
    })
}

fn newsletter_popup_close(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let popup = marker(site, Interstitial::NewsletterPopup);
        site.page().mouse_move(0.0, 0.0).await?;
        site.expect(popup.clone())
            .timeout(site.config().timeouts.newsletter())
            .to_be_visible()
            .await?;
        site.handle_mailchimp_popup().await?;
        site.expect(popup).to_be_hidden().await
    })
}

fn manage_cookie_preferences(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.page()
            .click(&Locator::css("#lgcookieslaw_customize_cookies_link"))
            .await?;
        site.expect(Locator::css(".fancybox-wrap #lgcookieslaw_modal"))
            .to_be_visible()
            .await
    })
}

fn popups_in_order(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.page().reload().await?;
        site.page().mouse_move(0.0, 0.0).await?;

        site.expect(marker(site, Interstitial::AgeGate)).to_be_visible().await?;
        site.handle_age_verification().await?;

        site.expect(marker(site, Interstitial::CookieConsent))
            .to_be_visible()
            .await?;
        site.handle_cookie_consent().await?;
        Ok(())
    })
}
