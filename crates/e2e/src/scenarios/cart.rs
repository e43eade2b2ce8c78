//! Cart suite: row projections, removal, and the response correlation
//! around opening the cart.

use std::time::Instant;

use crate::a11y::check_a11y;
use crate::error::HarnessError;
use crate::network::{ResponseWatch, DEFAULT_EXPECTED_STATUS, DEFAULT_RESPONSE_TIMEOUT};
use crate::fixtures::valid_checkout_info;
use crate::pages::{CartPage, CheckoutPage, LoginPage};
use crate::runner::{case, TestCase};
use crate::scenarios::{sign_in, BACKPACK, BACKPACK_PRICE};
use crate::visual::{VisualBaselines, VisualConfig};

pub fn cart_cases() -> Vec<TestCase> {
    vec![
        case(
            "cart: added item appears with name, price and quantity",
            &["smoke", "cart"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let catalog = CheckoutPage::new(session, &ctx.config);
                let cart = CartPage::new(session, &ctx.config);

                catalog.add_item_to_cart(BACKPACK).await?;
                cart.go_to_cart().await?;

                let names = cart.get_cart_item_names().await?;
                if names != [BACKPACK] {
                    return Err(HarnessError::Assertion(format!(
                        "expected exactly [{BACKPACK:?}] in the cart, got {names:?}"
                    )));
                }
                let prices = cart.get_cart_item_prices().await?;
                if !prices.iter().any(|p| p.contains(BACKPACK_PRICE)) {
                    return Err(HarnessError::Assertion(format!(
                        "cart row is missing the price {BACKPACK_PRICE}, got {prices:?}"
                    )));
                }
                let quantities = cart.get_cart_item_quantities().await?;
                if quantities != ["1"] {
                    return Err(HarnessError::Assertion(format!(
                        "expected quantity [\"1\"], got {quantities:?}"
                    )));
                }
                Ok(())
            },
        ),
        case(
            "cart: item keeps its catalog description",
            &["cart", "ui"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let catalog = CheckoutPage::new(session, &ctx.config);
                let cart = CartPage::new(session, &ctx.config);

                catalog.add_item_to_cart(BACKPACK).await?;
                cart.go_to_cart().await?;

                let descriptions = cart.get_cart_item_descriptions().await?;
                if descriptions.iter().all(|d| d.trim().is_empty()) {
                    return Err(HarnessError::Assertion(
                        "cart row has no description text".into(),
                    ));
                }
                Ok(())
            },
        ),
        case(
            "cart: shows a remove button for the added item",
            &["cart", "ui"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let catalog = CheckoutPage::new(session, &ctx.config);
                let cart = CartPage::new(session, &ctx.config);

                catalog.add_item_to_cart(BACKPACK).await?;
                cart.go_to_cart().await?;

                if !cart.is_remove_button_visible_for_item(BACKPACK).await? {
                    return Err(HarnessError::Assertion(format!(
                        "no remove button in the cart row for {BACKPACK:?}"
                    )));
                }
                Ok(())
            },
        ),
        case(
            "cart: removing the only item empties the cart",
            &["cart"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let catalog = CheckoutPage::new(session, &ctx.config);
                let cart = CartPage::new(session, &ctx.config);

                catalog.add_item_to_cart(BACKPACK).await?;
                cart.go_to_cart().await?;
                cart.remove_item(BACKPACK).await?;

                let names = cart.get_cart_item_names().await?;
                if names.iter().any(|n| n == BACKPACK) {
                    return Err(HarnessError::Assertion(format!(
                        "{BACKPACK:?} still listed after removal: {names:?}"
                    )));
                }
                if !cart.is_empty().await? {
                    return Err(HarnessError::Assertion(
                        "cart still has rows after removing its only item".into(),
                    ));
                }
                Ok(())
            },
        ),
        case(
            "cart: items persist across a page reload",
            &["cart", "regression"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let catalog = CheckoutPage::new(session, &ctx.config);
                let cart = CartPage::new(session, &ctx.config);

                catalog.add_item_to_cart(BACKPACK).await?;
                cart.go_to_cart().await?;
                let before = cart.get_cart_item_names().await?;

                session.reload().await?;

                let after = cart.get_cart_item_names().await?;
                if after != before {
                    return Err(HarnessError::Assertion(format!(
                        "cart changed across a reload: {before:?} -> {after:?}"
                    )));
                }
                Ok(())
            },
        ),
        case(
            "cart: duplicate add attempts never invent or lose rows",
            &["cart", "data"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let catalog = CheckoutPage::new(session, &ctx.config);
                let cart = CartPage::new(session, &ctx.config);

                catalog.add_item_to_cart(BACKPACK).await?;
                // Whether a second add is even offered is application
                // behavior; take it when the control is still there.
                if catalog.is_add_to_cart_visible(BACKPACK).await? {
                    catalog.add_item_to_cart(BACKPACK).await?;
                }
                cart.go_to_cart().await?;

                let names = cart.get_cart_item_names().await?;
                if names.is_empty() || names.iter().any(|n| n != BACKPACK) {
                    return Err(HarnessError::Assertion(format!(
                        "expected only {BACKPACK:?} rows, got {names:?}"
                    )));
                }
                let quantities = cart.get_cart_item_quantities().await?;
                if quantities.len() != names.len() {
                    return Err(HarnessError::Assertion(format!(
                        "{} rows but {} quantities",
                        names.len(),
                        quantities.len()
                    )));
                }
                Ok(())
            },
        ),
        case(
            "cart: empties after a successful checkout",
            &["cart", "journey"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let catalog = CheckoutPage::new(session, &ctx.config);
                let cart = CartPage::new(session, &ctx.config);

                catalog.add_item_to_cart(BACKPACK).await?;
                cart.go_to_cart().await?;
                catalog.click_checkout().await?;
                let info = valid_checkout_info();
                catalog
                    .fill_checkout_info(&info.first_name, &info.last_name, &info.postal_code)
                    .await?;
                catalog.finish_order().await?;
                catalog.assert_order_success().await?;

                cart.go_to_cart().await?;
                if !cart.is_empty().await? {
                    return Err(HarnessError::Assertion(
                        "cart still has rows after the order completed".into(),
                    ));
                }
                Ok(())
            },
        ),
        case(
            "cart: badge tracks adds and removals",
            &["cart", "ui"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let catalog = CheckoutPage::new(session, &ctx.config);
                let cart = CartPage::new(session, &ctx.config);

                catalog.add_item_to_cart(BACKPACK).await?;
                if cart.badge_count().await?.as_deref() != Some("1") {
                    return Err(HarnessError::Assertion(
                        "badge does not show 1 after adding one item".into(),
                    ));
                }

                cart.go_to_cart().await?;
                cart.remove_item(BACKPACK).await?;
                if let Some(badge) = cart.badge_count().await? {
                    return Err(HarnessError::Assertion(format!(
                        "badge still shows {badge:?} after the cart emptied"
                    )));
                }
                Ok(())
            },
        ),
        case(
            "cart: direct visit without signing in lands on the login form",
            &["security", "cart"],
            |ctx| async move {
                let session = ctx.session()?;
                let url = format!(
                    "{}/cart.html",
                    ctx.config.base_url.trim_end_matches('/')
                );
                session.goto(&url).await?;

                let login = LoginPage::new(session, &ctx.config);
                if !login.username_field_visible().await? {
                    return Err(HarnessError::Assertion(
                        "cart page served without authentication".into(),
                    ));
                }
                Ok(())
            },
        ),
        case(
            "cart: browser back returns to the catalog",
            &["cart", "ui"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let catalog = CheckoutPage::new(session, &ctx.config);
                let cart = CartPage::new(session, &ctx.config);

                cart.go_to_cart().await?;
                session.go_back().await?;

                if !catalog.is_add_to_cart_visible(BACKPACK).await? {
                    return Err(HarnessError::Assertion(
                        "catalog not restored after navigating back from the cart".into(),
                    ));
                }
                Ok(())
            },
        ),
        case(
            "cart: removing an item that is not in the cart fails loudly",
            &["cart", "negative"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let cart = CartPage::new(session, &ctx.config);
                cart.go_to_cart().await?;

                match cart.remove_item("No Such Product").await {
                    Err(HarnessError::NotFound(_)) => Ok(()),
                    Ok(()) => Err(HarnessError::Assertion(
                        "removing a missing item succeeded silently".into(),
                    )),
                    Err(e) => Err(e),
                }
            },
        ),
        case(
            "cart: opening the cart yields a successful document response",
            &["network", "cart"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let cart = CartPage::new(session, &ctx.config);

                let watch = ResponseWatch::begin(session).await?;
                cart.go_to_cart().await?;
                watch
                    .expect("cart", DEFAULT_EXPECTED_STATUS, DEFAULT_RESPONSE_TIMEOUT)
                    .await?;
                Ok(())
            },
        ),
        case(
            "cart: opens within the expectation budget",
            &["performance", "cart"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let cart = CartPage::new(session, &ctx.config);

                let start = Instant::now();
                cart.go_to_cart().await?;
                let elapsed = start.elapsed();

                if elapsed > ctx.config.navigation_timeout {
                    return Err(HarnessError::Assertion(format!(
                        "cart took {}ms to open, budget is {}ms",
                        elapsed.as_millis(),
                        ctx.config.navigation_timeout.as_millis()
                    )));
                }
                Ok(())
            },
        ),
        case(
            "cart: page matches its visual baseline",
            &["visual", "cart"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let catalog = CheckoutPage::new(session, &ctx.config);
                let cart = CartPage::new(session, &ctx.config);

                catalog.add_item_to_cart(BACKPACK).await?;
                cart.go_to_cart().await?;

                let baselines = VisualBaselines::new(VisualConfig {
                    baseline_dir: ctx.config.output_dir.join("baselines"),
                    actual_dir: ctx.config.output_dir.join("actual"),
                    diff_dir: ctx.config.output_dir.join("diffs"),
                    ..VisualConfig::default()
                })?;
                session
                    .screenshot(&baselines.actual_path("cart-page"), false)
                    .await?;
                baselines.assert_matches("cart-page")
            },
        ),
        case(
            "cart: page passes the accessibility audit",
            &["a11y", "cart"],
            |ctx| async move {
                sign_in(&ctx).await?;
                let session = ctx.session()?;
                let catalog = CheckoutPage::new(session, &ctx.config);
                let cart = CartPage::new(session, &ctx.config);

                catalog.add_item_to_cart(BACKPACK).await?;
                cart.go_to_cart().await?;
                check_a11y(session, ctx.config.a11y_policy).await?;
                Ok(())
            },
        ),
    ]
}
