//! Catalog and checkout flow.
//!
//! Mirrors how the storefront splits its journey: the add-to-cart action
//! lives on the catalog screen, the information form and the summary on
//! the two checkout steps.

use crate::config::HarnessConfig;
use crate::driver::DriverSession;
use crate::error::{HarnessError, HarnessResult};
use crate::pages::eventually;

const INVENTORY_ITEM: &str = ".inventory_item";
const CART_LINK: &str = ".shopping_cart_link";
const ADD_TO_CART_BUTTON: &str = "add to cart";
const CHECKOUT_BUTTON: &str = "checkout";
const CONTINUE_BUTTON: &str = "continue";
const FINISH_BUTTON: &str = "finish";
const FIRST_NAME_PLACEHOLDER: &str = "First Name";
const LAST_NAME_PLACEHOLDER: &str = "Last Name";
const POSTAL_CODE_PLACEHOLDER: &str = "Zip/Postal Code";
const ERROR_MESSAGE: &str = ".error-message-container, [data-test=\"error\"]";
const SUMMARY_SECTION: &str = ".summary_info";
const ORDER_CONFIRMATION: &str = "THANK YOU FOR YOUR ORDER";

pub struct CheckoutPage<'a> {
    session: &'a DriverSession,
    config: &'a HarnessConfig,
}

impl<'a> CheckoutPage<'a> {
    pub fn new(session: &'a DriverSession, config: &'a HarnessConfig) -> Self {
        Self { session, config }
    }

    /// Add the catalog entry with this visible name to the cart. An
    /// unknown name surfaces as [`HarnessError::NotFound`].
    pub async fn add_item_to_cart(&self, item_name: &str) -> HarnessResult<()> {
        if self.session.row_count(INVENTORY_ITEM, item_name).await? == 0 {
            return Err(HarnessError::NotFound(format!("catalog entry: {item_name}")));
        }
        self.session
            .row_click(INVENTORY_ITEM, item_name, ADD_TO_CART_BUTTON)
            .await
    }

    pub async fn go_to_cart(&self) -> HarnessResult<()> {
        self.session.click(CART_LINK).await
    }

    /// Whether the add-to-cart control is still offered for this catalog
    /// entry. The storefront swaps it for a remove control once added.
    pub async fn is_add_to_cart_visible(&self, item_name: &str) -> HarnessResult<bool> {
        self.session
            .row_button_visible(INVENTORY_ITEM, item_name, ADD_TO_CART_BUTTON)
            .await
    }

    pub async fn click_checkout(&self) -> HarnessResult<()> {
        self.session.click_by_role("button", CHECKOUT_BUTTON).await
    }

    /// Fill the three information fields and advance. No local validation:
    /// the application validates, and tests observe the outcome afterward.
    pub async fn fill_checkout_info(
        &self,
        first_name: &str,
        last_name: &str,
        postal_code: &str,
    ) -> HarnessResult<()> {
        self.session
            .fill_by_placeholder(FIRST_NAME_PLACEHOLDER, first_name)
            .await?;
        self.session
            .fill_by_placeholder(LAST_NAME_PLACEHOLDER, last_name)
            .await?;
        self.session
            .fill_by_placeholder(POSTAL_CODE_PLACEHOLDER, postal_code)
            .await?;
        self.session.click_by_role("button", CONTINUE_BUTTON).await
    }

    pub async fn finish_order(&self) -> HarnessResult<()> {
        self.session.click_by_role("button", FINISH_BUTTON).await
    }

    pub async fn assert_order_success(&self) -> HarnessResult<()> {
        let visible = eventually(self.config.expect_timeout, || async move {
            self.session.text_visible(ORDER_CONFIRMATION, false).await
        })
        .await?;

        if visible {
            Ok(())
        } else {
            Err(HarnessError::Assertion(
                "expected the order confirmation message".into(),
            ))
        }
    }

    /// The form rejected the submission with a visible error.
    pub async fn assert_checkout_error(&self) -> HarnessResult<()> {
        let visible = eventually(self.config.expect_timeout, || async move {
            self.session.is_visible(ERROR_MESSAGE).await
        })
        .await?;

        if visible {
            Ok(())
        } else {
            Err(HarnessError::Assertion(
                "expected a visible checkout validation error".into(),
            ))
        }
    }

    /// Whether the order summary shows this exact line (for example
    /// `Item total: $29.99`).
    pub async fn summary_shows(&self, text: &str) -> HarnessResult<bool> {
        let summary = self
            .session
            .text_content(SUMMARY_SECTION)
            .await?
            .unwrap_or_default();
        Ok(summary.contains(text))
    }

    pub async fn assert_summary_shows(&self, text: &str) -> HarnessResult<()> {
        if self.summary_shows(text).await? {
            Ok(())
        } else {
            Err(HarnessError::Assertion(format!(
                "order summary is missing: {text}"
            )))
        }
    }

    pub async fn first_name_field_visible(&self) -> HarnessResult<bool> {
        self.session
            .placeholder_visible(FIRST_NAME_PLACEHOLDER)
            .await
    }

    pub async fn last_name_field_visible(&self) -> HarnessResult<bool> {
        self.session
            .placeholder_visible(LAST_NAME_PLACEHOLDER)
            .await
    }

    pub async fn postal_code_field_visible(&self) -> HarnessResult<bool> {
        self.session
            .placeholder_visible(POSTAL_CODE_PLACEHOLDER)
            .await
    }
}
