//! Payment link generation for the buy buttons.
//!
//! The link points at the hosted PayPal checkout with the item pre-filled.
//! The return, cancel and notify targets are all the page the buyer came from.

use reqwest::Url;
use thiserror::Error;
use tracing::debug;

use crate::catalog::format_amount;
use crate::storefront::render::PurchasePayload;

pub const PAYPAL_CHECKOUT_URL: &str = "https://www.paypal.com/cgi-bin/webscr";
pub const CURRENCY_CODE: &str = "EUR";
pub const DEFAULT_BUSINESS: &str = "votre-email@paypal.com";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("missing product information")]
    MissingProductInfo,

    #[error("invalid URL '{url}'")]
    InvalidUrl { url: String },
}

#[derive(Clone, Debug)]
pub struct CheckoutLinks {
    business: String,
    page_url: Url,
}

impl CheckoutLinks {
    pub fn new(business: &str, page_url: &str) -> Result<Self, CheckoutError> {
        let page_url = Url::parse(page_url).map_err(|_| CheckoutError::InvalidUrl {
            url: page_url.to_string(),
        })?;
        Ok(Self {
            business: business.to_string(),
            page_url,
        })
    }

    pub fn business(&self) -> &str {
        &self.business
    }

    /// Builds the checkout URL. `price` is sent as displayed; empty values
    /// abort the purchase.
    pub fn purchase_url(&self, product_name: &str, price: &str) -> Result<Url, CheckoutError> {
        if product_name.is_empty() || price.is_empty() {
            return Err(CheckoutError::MissingProductInfo);
        }

        let mut url = Url::parse(PAYPAL_CHECKOUT_URL).map_err(|_| CheckoutError::InvalidUrl {
            url: PAYPAL_CHECKOUT_URL.to_string(),
        })?;
        let page = self.page_url.as_str();
        url.query_pairs_mut()
            .append_pair("cmd", "_xclick")
            .append_pair("business", &self.business)
            .append_pair("item_name", product_name)
            .append_pair("amount", price)
            .append_pair("currency_code", CURRENCY_CODE)
            .append_pair("no_shipping", "1")
            .append_pair("return", page)
            .append_pair("cancel_return", page)
            .append_pair("notify_url", page);

        debug!(item = product_name, amount = price, "payment link generated");
        Ok(url)
    }

    pub fn for_payload(&self, payload: &PurchasePayload) -> Result<Url, CheckoutError> {
        self.purchase_url(&payload.product_name, &format_amount(payload.price))
    }
}
