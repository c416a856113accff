//! Header, footer and menu navigation

use regex::Regex;
use std::time::Duration;

use crate::expect::expect_url;
use crate::locator::{Locator, TextMatch};
use crate::storefront::{selectors, Storefront};

use super::login::expect_login_form;
use super::{Bootstrap, Scenario, ScenarioFn, ScenarioFuture, Suite};

fn nav(id: &'static str, title: &'static str, tags: &'static [&'static str], run: ScenarioFn) -> Scenario {
    Scenario {
        id,
        title,
        group: "navigation",
        suite: Suite::Regression,
        tags,
        bootstrap: Bootstrap::ClearPage,
        run,
    }
}

pub(super) fn scenarios() -> Vec<Scenario> {
    vec![
        nav("mainMenuVisible", "Main navigation menu is visible", &["menu"], main_menu_visible),
        nav("homeNavigation", "Home link navigates correctly", &["menu"], home_navigation),
        nav(
            "productCategoriesMenu",
            "Product categories in menu work",
            &["menu"],
            product_categories,
        ),
        nav("dropdownMenus", "Dropdown menus functionality", &["menu"], dropdown_menus),
        nav("headerSearch", "Search functionality in header", &["search"], header_search),
        nav(
            "userAccountMenu",
            "User account menu functionality",
            &["menu", "login"],
            user_account_menu,
        ),
        nav("cartIconHeader", "Cart icon in header works", &["cart"], cart_icon),
        nav("footerNavigation", "Footer navigation links", &["footer"], footer_navigation),
        nav("mobileMenu", "Mobile menu functionality", &["menu", "mobile"], mobile_menu),
        nav(
            "breadcrumbNavigation",
            "Breadcrumb navigation",
            &["menu"],
            breadcrumb_navigation,
        ),
    ]
}

fn main_menu_visible(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.expect(Locator::css("nav, .navbar, .main-menu, [role=\"navigation\"]").first())
            .to_be_visible()
            .await
    })
}

fn home_navigation(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let first_category = Locator::css("ul.top-menu").first().locator("a").first();
        site.page().click(&first_category).await?;

        site.page()
            .click(&Locator::css("#_desktop_logo a").first())
            .await?;
        site.verify_home_page().await
    })
}

fn product_categories(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let category = Locator::role_named(
            "link",
            TextMatch::regex_i("sigarette|liquidi|accessori|category|prodotti"),
        )
        .first();

        if site.page().is_visible(&category).await? {
            site.page().click(&category).await?;
            site.expect(Locator::role("listitem").first()).to_be_visible().await?;
        }
        Ok(())
    })
}

fn dropdown_menus(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let trigger = Locator::css("[class*=\"dropdown\"], [data-toggle=\"dropdown\"], .has-dropdown > a").first();
        if !site.page().is_visible(&trigger).await? {
            return Ok(());
        }
        site.page().hover(&trigger).await?;

        let menu = Locator::css(".dropdown-menu, [class*=\"submenu\"], .dropdown-content").first();
        if site.page().is_visible(&menu).await? {
            site.expect(menu).to_be_visible().await?;
        }
        Ok(())
    })
}

fn header_search(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let search = Locator::role("searchbox").or(Locator::placeholder(TextMatch::regex_i("cerca|search")));

        if site.page().is_visible(&search).await? {
            site.page().fill(&search, "vape").await?;
            site.page().press(&search, "Enter").await?;
            site.verify_search_page().await?;
        }
        Ok(())
    })
}

fn user_account_menu(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.go_to_login_page().await?;
        expect_login_form(site).await
    })
}

fn cart_icon(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.add_item_to_cart().await?;
        site.page().click(&selectors::cart_icon()).await?;

        let cart_url = Regex::new(r"/carrello\?action=show")?;
        expect_url(site.page(), &cart_url, site.config().timeouts.assertion()).await?;

        let heading = Locator::role_named("heading", TextMatch::regex_i("carrello|cart|La novità")).level(1);
        site.expect(heading).to_be_visible().await
    })
}

fn footer_navigation(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.scroll_to_bottom().await?;

        let link = Locator::css("footer a, .footer a").first();
        if site.page().is_visible(&link).await? {
            site.page().click(&link).await?;
            // Give the navigation time to settle
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
        Ok(())
    })
}

fn mobile_menu(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        site.set_mobile_viewport().await?;

        let trigger = Locator::css(".hamburger, .mobile-menu-toggle, [aria-label*=\"menu\"], .menu-toggle");
        if !site.page().is_visible(&trigger).await? {
            return Ok(());
        }
        site.page().click(&trigger).await?;

        let menu = Locator::css(".mobile-menu, .sidebar-menu, [class*=\"mobile-nav\"]");
        if site.page().is_visible(&menu).await? {
            site.expect(menu).to_be_visible().await?;
        }
        Ok(())
    })
}

fn breadcrumb_navigation(site: &Storefront) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let category = Locator::role_named("link", TextMatch::regex_i("categoria|category|prodotti")).first();
        if !site.page().is_visible(&category).await? {
            return Ok(());
        }
        site.page().click(&category).await?;

        let breadcrumb = Locator::css(".breadcrumb, .breadcrumbs, [aria-label*=\"breadcrumb\"]");
        if !site.page().is_visible(&breadcrumb).await? {
            return Ok(());
        }
        site.expect(breadcrumb.clone()).to_be_visible().await?;

        let home = breadcrumb
            .get_by_role("link", Some(TextMatch::regex_i("home|casa")))
            .first();
        site.page().click(&home).await?;

        site.expect(Locator::role("listitem").filter_text("La novità  Anteprima"))
            .to_be_visible()
            .await
    })
}
