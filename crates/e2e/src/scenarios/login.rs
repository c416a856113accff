//! Customer login and logout

use serde_json::Value;

use crate::error::E2eResult;
use crate::expect::ensure;
use crate::locator::{Locator, TextMatch};
use crate::storefront::{selectors, Storefront};

use super::{Bootstrap, Scenario, ScenarioFn, ScenarioFuture, Suite};

fn login(id: &'static str, title: &'static str, run: ScenarioFn) -> Scenario {
    Scenario {
        id,
        title,
        group: "login",
        suite: Suite::Functional,
        tags: &["login"],
        bootstrap: Bootstrap::ClearPage,
        run,
    }
}

fn logout(id: &'static str, title: &'static str, run: ScenarioFn) -> Scenario {
    Scenario {
        id,
        title,
        group: "logout",
        suite: Suite::Functional,
        tags: &["login", "logout"],
        bootstrap: Bootstrap::ClearPage,
        run,
    }
}

pub(super) fn scenarios() -> Vec<Scenario> {
    vec![
        login("goToLoginPage", "should go to login page", go_to_login_page),
        login("displayLoginForm", "should display login form", display_login_form),
        login(
            "invalidCredentials",
            "should show error with invalid credentials",
            invalid_credentials,
        ),
        login(
            "invalidEmailFormat",
            "should show error with invalid email format",
            invalid_email_format,
        ),
        login(
            "togglePasswordVisibility",
            "should toggle password visibility",
            toggle_password_visibility,
        ),
        login("validLogin", "should login with valid credentials", valid_login),
        login(
            "maintainCartAfterLogin",
            "should maintain cart contents after login",
            cart_survives_login,
        ),
        logout(
            "logoutViaHeader",
            "should login and logout via header link",
            logout_via_header,
        ),
        logout(
            "logoutViaAccountPage",
            "should login and logout via account page",
            logout_via_account_page,
        ),
        logout(
            "verifySessionAfterLogout",
            "should verify user session after logout",
            session_ends_after_logout,
        ),
    ]
}

/// Login form fields and submit button are all visible
pub(super) async fn expect_login_form(site: &Storefront) -> E2eResult<()> {
    site.expect(selectors::email_input()).to_be_visible().await?;
    site.expect(selectors::password_input()).to_be_visible().await?;
    site.expect(selectors::login_button()).to_be_visible().await
}

fn go_to_login_page(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(site.go_to_login_page())
}

fn display_login_form(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.go_to_login_page().await?;
        expect_login_form(site).await
    })
}

fn invalid_credentials(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.login_with("invalid@email.com", "wrongpassword").await?;
        site.verify_login_failure().await
    })
}

fn invalid_email_format(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.go_to_login_page().await?;
        site.fill_login_form("invalidemail", "somepassword").await?;
        site.submit_login_form().await?;

        let email = selectors::email_input();
        site.page()
            .evaluate(
                Some(&email),
                "input => { if (input instanceof HTMLInputElement) input.reportValidity(); }",
            )
            .await?;
        let mismatch = site
            .page()
            .evaluate(
                Some(&email),
                "input => input instanceof HTMLInputElement ? input.validity.typeMismatch : false",
            )
            .await?;
        ensure(
            mismatch == Value::Bool(true),
            format!("expected a type mismatch on the email field, got {}", mismatch),
        )
    })
}

fn toggle_password_visibility(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.go_to_login_page().await?;

        let password = selectors::password_input();
        site.expect(password.clone())
            .to_have_attribute("type", "password")
            .await?;

        let show = Locator::role_named("button", TextMatch::regex_i("show|mostra|eye")).first();
        if site.page().is_visible(&show).await? {
            site.page().click(&show).await?;
            site.expect(password).to_have_attribute("type", "text").await?;
        }
        Ok(())
    })
}

fn valid_login(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.login().await?;
        site.verify_login_success().await
    })
}

fn cart_survives_login(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.add_item_to_cart().await?;
        site.login().await?;
        site.verify_login_success().await?;
        site.verify_cart_has_items().await
    })
}

fn logout_via_header(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.login().await?;
        site.verify_login_success().await?;
        site.logout_via_header().await?;
        site.verify_logout_success().await
    })
}

fn logout_via_account_page(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.login().await?;
        site.verify_login_success().await?;
        site.logout_via_account_page().await?;
        site.verify_authentication_page().await
    })
}

fn session_ends_after_logout(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.login().await?;
        site.verify_login_success().await?;
        site.logout_via_header().await?;

        // Protected page must bounce back to authentication
        site.page().goto(&site.url("/account")).await?;
        site.verify_authentication_page().await
    })
}
