//! The storefront test suites.
//!
//! Each submodule builds a list of [`TestCase`]s for one screen of the
//! purchase journey. Cases are plain data until the runner executes them,
//! so suites can be filtered, counted, and inspected without a browser.

use crate::error::HarnessResult;
use crate::runner::{TestCase, TestContext};

mod cart;
mod checkout;
mod login;

pub use cart::cart_cases;
pub use checkout::checkout_cases;
pub use login::login_cases;

/// The product every journey test exercises, exactly as rendered.
pub(crate) const BACKPACK: &str = "Sauce Labs Backpack";
pub(crate) const BACKPACK_PRICE: &str = "$29.99";
pub(crate) const ITEM_TOTAL_LINE: &str = "Item total: $29.99";
pub(crate) const TAX_LINE: &str = "Tax: $2.40";
pub(crate) const TOTAL_LINE: &str = "Total: $32.39";

/// Shared journey prefix: land on the entry point and sign in with the
/// configured valid credentials.
pub(crate) async fn sign_in(ctx: &TestContext) -> HarnessResult<()> {
    let session = ctx.session()?;
    let login = crate::pages::LoginPage::new(session, &ctx.config);
    login.goto().await?;
    login
        .login(&ctx.config.credentials.username, &ctx.config.credentials.password)
        .await?;
    login.assert_login_success().await
}

/// Every suite, in journey order.
pub fn all_cases(config: &crate::config::HarnessConfig) -> Vec<TestCase> {
    let mut cases = login_cases(config);
    cases.extend(cart_cases());
    cases.extend(checkout_cases());
    cases
}
