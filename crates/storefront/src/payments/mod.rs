//! Payment processor integration.
//!
//! The processor is an opaque external service with a Stripe-shaped REST
//! API: we create a hosted checkout session for an order, the shopper pays
//! on the processor's page, and settlement comes back asynchronously as a
//! signed webhook event handled in [`webhook`]. No card data ever touches
//! this process.

pub mod webhook;

use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use uuid::Uuid;

use prickly_pear_core::quantize;

use crate::config::PaymentsConfig;
use crate::models::OrderWithLines;

/// Errors talking to the payment processor.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Transport-level failure.
    #[error("payment processor unreachable: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor answered with an error status.
    #[error("payment processor rejected the request ({status}): {message}")]
    Api {
        /// HTTP status returned.
        status: u16,
        /// Error body, best effort.
        message: String,
    },

    /// An amount could not be expressed in minor units.
    #[error("amount out of range for minor units")]
    AmountOutOfRange,
}

/// A hosted checkout session created at the processor.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Processor-side session id.
    pub id: String,
    /// URL to send the shopper to.
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ProcessorCoupon {
    id: String,
}

/// Client for the processor's server-side API.
pub struct PaymentsClient {
    http: Client,
    api_base: String,
    secret_key: SecretString,
    currency: String,
}

impl PaymentsClient {
    /// Build a client from configuration.
    #[must_use]
    pub fn new(config: &PaymentsConfig) -> Self {
        Self {
            http: Client::new(),
            api_base: config.api_base.clone(),
            secret_key: config.secret_key.clone(),
            currency: config.currency.clone(),
        }
    }

    /// Create a hosted checkout session for an order.
    ///
    /// Line items use the order's *frozen* unit prices converted to minor
    /// units; the live catalog is not consulted. When the order carries a
    /// snapshotted discount, a one-off percent coupon is created at the
    /// processor and attached to the session. The order id rides along
    /// twice: as `client_reference_id` for the authoritative
    /// `checkout.session.completed` event, and as payment-intent metadata
    /// for the `payment_intent.succeeded` fallback.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` if the processor is unreachable, rejects the
    /// request, or an amount does not fit minor units.
    pub async fn create_checkout_session(
        &self,
        order: &OrderWithLines,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("client_reference_id".into(), order.order.id.to_string()),
            ("success_url".into(), success_url.to_owned()),
            ("cancel_url".into(), cancel_url.to_owned()),
            (
                "payment_intent_data[metadata][order_id]".into(),
                order.order.id.to_string(),
            ),
        ];

        for (i, line) in order.lines.iter().enumerate() {
            form.push((
                format!("line_items[{i}][price_data][currency]"),
                self.currency.clone(),
            ));
            form.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                minor_units(line.unit_price)?.to_string(),
            ));
            form.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                line.product_name.clone(),
            ));
            form.push((format!("line_items[{i}][quantity]"), line.quantity.to_string()));
        }

        if order.order.discount_percent > 0 {
            let coupon = self
                .create_percent_coupon(order.order.discount_percent)
                .await?;
            form.push(("discounts[0][coupon]".into(), coupon.id));
        }

        self.post_form("/v1/checkout/sessions", &form).await
    }

    /// Create a single-use percent-off coupon at the processor.
    async fn create_percent_coupon(&self, percent: i32) -> Result<ProcessorCoupon, PaymentError> {
        let form = vec![
            ("percent_off".to_owned(), percent.to_string()),
            ("duration".to_owned(), "once".to_owned()),
        ];
        self.post_form("/v1/coupons", &form).await
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, PaymentError> {
        let response = self
            .http
            .post(format!("{}{path}", self.api_base))
            .basic_auth(self.secret_key.expose_secret(), Option::<&str>::None)
            // Retries of a failed send must not create a second session.
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

/// Convert a decimal amount to integer minor units (cents).
///
/// The amount is quantized to 2 digits first, so `19.99` becomes `1999`.
fn minor_units(amount: Decimal) -> Result<i64, PaymentError> {
    (quantize(amount) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or(PaymentError::AmountOutOfRange)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(minor_units(d("19.99")).unwrap(), 1999);
        assert_eq!(minor_units(d("5")).unwrap(), 500);
        assert_eq!(minor_units(d("0.005")).unwrap(), 1);
    }
}
