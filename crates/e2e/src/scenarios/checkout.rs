//! Checkout suite: the full purchase journey with its literal totals,
//! the generated invalid-information matrix, and the markup-injection
//! checks on the information form.

use std::time::Instant;

use crate::error::HarnessError;
use crate::fixtures::{
    injection_payloads, invalid_checkout_info, random_customer, valid_checkout_info,
};
use crate::generator::{describe_json, expand, TestRecord};
use crate::pages::{CartPage, CheckoutPage};
use crate::runner::{case, TestCase, TestContext};
use crate::scenarios::{sign_in, BACKPACK, ITEM_TOTAL_LINE, TAX_LINE, TOTAL_LINE};

/// Journey prefix shared by every checkout case: signed in, one backpack
/// in the cart, information form open.
async fn open_information_form(ctx: &TestContext) -> crate::error::HarnessResult<()> {
    sign_in(ctx).await?;
    let session = ctx.session()?;
    let catalog = CheckoutPage::new(session, &ctx.config);
    let cart = CartPage::new(session, &ctx.config);

    catalog.add_item_to_cart(BACKPACK).await?;
    cart.go_to_cart().await?;
    catalog.click_checkout().await
}

pub fn checkout_cases() -> Vec<TestCase> {
    let mut cases = vec![
        case(
            "checkout: completes the full purchase journey",
            &["smoke", "checkout", "journey"],
            |ctx| async move {
                open_information_form(&ctx).await?;
                let session = ctx.session()?;
                let checkout = CheckoutPage::new(session, &ctx.config);

                let info = valid_checkout_info();
                checkout
                    .fill_checkout_info(&info.first_name, &info.last_name, &info.postal_code)
                    .await?;

                // The overview must show the item and the exact totals
                // before the order is placed.
                checkout.assert_summary_shows(ITEM_TOTAL_LINE).await?;
                checkout.assert_summary_shows(TAX_LINE).await?;
                checkout.assert_summary_shows(TOTAL_LINE).await?;

                checkout.finish_order().await?;
                checkout.assert_order_success().await
            },
        ),
        case(
            "checkout: information form exposes all three fields",
            &["ui", "checkout"],
            |ctx| async move {
                open_information_form(&ctx).await?;
                let session = ctx.session()?;
                let checkout = CheckoutPage::new(session, &ctx.config);

                for (field, visible) in [
                    ("first name", checkout.first_name_field_visible().await?),
                    ("last name", checkout.last_name_field_visible().await?),
                    ("postal code", checkout.postal_code_field_visible().await?),
                ] {
                    if !visible {
                        return Err(HarnessError::Assertion(format!(
                            "{field} field is not visible on the information form"
                        )));
                    }
                }
                Ok(())
            },
        ),
        case(
            "checkout: order completes within the navigation budget",
            &["performance", "checkout"],
            |ctx| async move {
                open_information_form(&ctx).await?;
                let session = ctx.session()?;
                let checkout = CheckoutPage::new(session, &ctx.config);
                let info = valid_checkout_info();

                let start = Instant::now();
                checkout
                    .fill_checkout_info(&info.first_name, &info.last_name, &info.postal_code)
                    .await?;
                checkout.finish_order().await?;
                checkout.assert_order_success().await?;
                let elapsed = start.elapsed();

                if elapsed > ctx.config.navigation_timeout {
                    return Err(HarnessError::Assertion(format!(
                        "order took {}ms to complete, budget is {}ms",
                        elapsed.as_millis(),
                        ctx.config.navigation_timeout.as_millis()
                    )));
                }
                Ok(())
            },
        ),
        case(
            "checkout: accepts a randomized complete customer record",
            &["regression", "checkout"],
            |ctx| async move {
                open_information_form(&ctx).await?;
                let session = ctx.session()?;
                let checkout = CheckoutPage::new(session, &ctx.config);

                let customer = random_customer();
                checkout
                    .fill_checkout_info(
                        &customer.first_name,
                        &customer.last_name,
                        &customer.postal_code,
                    )
                    .await?;
                checkout.finish_order().await?;
                checkout.assert_order_success().await
            },
        ),
    ];

    for record in expand(
        "checkout: rejects incomplete information",
        invalid_checkout_info(),
        describe_json,
    ) {
        let TestRecord {
            description,
            fixture,
        } = record;
        cases.push(case(
            &description,
            &["checkout", "negative"],
            move |ctx| {
                let info = fixture.clone();
                async move {
                    open_information_form(&ctx).await?;
                    let session = ctx.session()?;
                    let checkout = CheckoutPage::new(session, &ctx.config);
                    checkout
                        .fill_checkout_info(&info.first_name, &info.last_name, &info.postal_code)
                        .await?;
                    checkout.assert_checkout_error().await
                }
            },
        ));
    }

    for record in expand(
        "checkout: markup in the first-name field must not execute",
        injection_payloads(),
        |p| format!("{p:?}"),
    ) {
        let TestRecord {
            description,
            fixture,
        } = record;
        cases.push(case(
            &description,
            &["security", "checkout"],
            move |ctx| {
                let payload = fixture;
                async move {
                    open_information_form(&ctx).await?;
                    let session = ctx.session()?;
                    let checkout = CheckoutPage::new(session, &ctx.config);

                    // Intercept alert before the payload has any chance to
                    // run, then flush the form through submission.
                    session
                        .evaluate("window.alert = () => { window.__alert_fired = true; }")
                        .await?;
                    checkout
                        .fill_checkout_info(payload, "Doe", "12345")
                        .await?;

                    let fired = session
                        .evaluate("window.__alert_fired === true")
                        .await?
                        .as_bool()
                        .unwrap_or(false);
                    if fired {
                        return Err(HarnessError::Assertion(format!(
                            "injected markup executed: {payload}"
                        )));
                    }
                    Ok(())
                }
            },
        ));
    }

    cases
}
