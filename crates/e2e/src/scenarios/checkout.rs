//! Cart and checkout regression

use std::time::Duration;

use crate::error::E2eResult;
use crate::locator::{Locator, TextMatch};
use crate::storefront::{selectors, Storefront};

use super::{Bootstrap, Scenario, ScenarioFn, ScenarioFuture, Suite};

const PAYMENT_OPTION: &str = "#payment-option-1-container";
const PAYMENT_FORM: &str = "#pay-with-payment-option-1-form";

/// Accessible structure of the card payment form
pub const PAYMENT_FORM_SNAPSHOT: &str = r#"
- img
- img
- img
- img
- img
- img
- paragraph: Paga in tutta sicurezza con carta di credito, debito e prepagata tramite Nexi.
"#;

fn checkout(id: &'static str, title: &'static str, run: ScenarioFn) -> Scenario {
    Scenario {
        id,
        title,
        group: "checkout",
        suite: Suite::Regression,
        tags: &["cart", "checkout"],
        bootstrap: Bootstrap::ClearPage,
        run,
    }
}

pub(super) fn scenarios() -> Vec<Scenario> {
    vec![
        checkout(
            "paymentOptionValidation",
            "Payment option selection and form validation",
            payment_option_validation,
        ),
        checkout(
            "paymentFormAriaSnapshot",
            "Payment form Aria snapshot validation",
            payment_form_aria_snapshot,
        ),
        checkout(
            "cartValidationBeforeCheckout",
            "Cart validation before checkout",
            cart_validation_before_checkout,
        ),
    ]
}

/// Sign in from the checkout's login tab and open the first payment option
async fn login_and_select_payment(site: &Storefront) -> E2eResult<()> {
    site.page()
        .click(&Locator::role_named("tab", "Login"))
        .await?;
    site.expect(Locator::text("Login E-mail Parola d'ordine"))
        .to_be_visible()
        .await?;
    site.fill_default_login_form().await?;
    site.page()
        .click(&Locator::role_named("button", "Registrazione"))
        .await?;

    let option = Locator::css(PAYMENT_OPTION);
    site.expect(option.clone())
        .timeout(Duration::from_secs(10))
        .to_be_visible()
        .await?;
    site.page().click(&option).await?;

    site.expect(Locator::css(PAYMENT_FORM)).to_be_visible().await
}

fn payment_option_validation(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.add_item_to_cart_and_checkout().await?;
        site.page().click(&selectors::proceed_to_checkout()).await?;
        login_and_select_payment(site).await
    })
}

fn payment_form_aria_snapshot(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.add_item_to_cart_and_checkout().await?;
        login_and_select_payment(site).await?;
        site.expect(Locator::css(PAYMENT_FORM))
            .to_match_aria_snapshot(PAYMENT_FORM_SNAPSHOT)
            .await
    })
}

fn cart_validation_before_checkout(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.page()
            .click(&Locator::css("#tvcms_cart_button a"))
            .await?;

        let checkout_button = Locator::css(".checkout button");
        if site.page().is_visible(&checkout_button).await? {
            site.expect(checkout_button).to_be_disabled().await
        } else {
            let empty = TextMatch::regex_i("Non ci sono più articoli nel tuo carrello|empty cart|no items");
            site.expect(Locator::text(empty)).to_be_visible().await
        }
    })
}
