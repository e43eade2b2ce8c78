//! Cart screen.
//!
//! Every projection returns values exactly as rendered, in order, with
//! duplicate rows preserved. Whether a duplicate add collapses into one
//! row is application behavior under test, never a page-object decision.

use crate::config::HarnessConfig;
use crate::driver::DriverSession;
use crate::error::{HarnessError, HarnessResult};

const CART_LINK: &str = ".shopping_cart_link";
const CART_BADGE: &str = ".shopping_cart_badge";
const CART_CONTAINER: &str = "#cart_contents_container";
const CART_ITEM: &str = ".cart_item";
const ITEM_NAME: &str = ".cart_item .inventory_item_name";
const ITEM_DESCRIPTION: &str = ".cart_item .inventory_item_desc";
const ITEM_PRICE: &str = ".cart_item .inventory_item_price";
const ITEM_QUANTITY: &str = ".cart_item .cart_quantity";
const REMOVE_BUTTON: &str = "remove";

pub struct CartPage<'a> {
    session: &'a DriverSession,
    config: &'a HarnessConfig,
}

impl<'a> CartPage<'a> {
    pub fn new(session: &'a DriverSession, config: &'a HarnessConfig) -> Self {
        Self { session, config }
    }

    pub async fn go_to_cart(&self) -> HarnessResult<()> {
        self.session.click(CART_LINK).await?;
        self.session
            .wait_for_selector(CART_CONTAINER, self.config.expect_timeout)
            .await
    }

    pub async fn get_cart_item_names(&self) -> HarnessResult<Vec<String>> {
        self.session.all_text_contents(ITEM_NAME).await
    }

    pub async fn get_cart_item_descriptions(&self) -> HarnessResult<Vec<String>> {
        self.session.all_text_contents(ITEM_DESCRIPTION).await
    }

    pub async fn get_cart_item_prices(&self) -> HarnessResult<Vec<String>> {
        self.session.all_text_contents(ITEM_PRICE).await
    }

    pub async fn get_cart_item_quantities(&self) -> HarnessResult<Vec<String>> {
        self.session.all_text_contents(ITEM_QUANTITY).await
    }

    /// Scoped to the cart row containing `item_name`; if several rows
    /// match, the first rendered match wins.
    pub async fn is_remove_button_visible_for_item(&self, item_name: &str) -> HarnessResult<bool> {
        self.session
            .row_button_visible(CART_ITEM, item_name, REMOVE_BUTTON)
            .await
    }

    /// Remove the first cart row matching `item_name`. A missing row is an
    /// explicit not-found failure, never a silent no-op.
    pub async fn remove_item(&self, item_name: &str) -> HarnessResult<()> {
        if self.session.row_count(CART_ITEM, item_name).await? == 0 {
            return Err(HarnessError::NotFound(format!("cart row: {item_name}")));
        }
        self.session
            .row_click(CART_ITEM, item_name, REMOVE_BUTTON)
            .await
    }

    /// Structural emptiness: zero item rows. Deliberately not a check for
    /// an "empty cart" message, which the application does not render.
    pub async fn is_empty(&self) -> HarnessResult<bool> {
        Ok(self.session.count(CART_ITEM).await? == 0)
    }

    /// Text of the cart badge, or `None` when the application hides the
    /// badge entirely (its rendering for an empty cart).
    pub async fn badge_count(&self) -> HarnessResult<Option<String>> {
        if self.session.count(CART_BADGE).await? == 0 {
            return Ok(None);
        }
        self.session.text_content(CART_BADGE).await
    }
}
