//! Order read models for the staff panel.
//!
//! The panel never mutates orders; settlement happens on the storefront's
//! webhook. Totals are recomputed from the frozen line prices and the
//! snapshotted discount percent, the same arithmetic the shopper saw.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use prickly_pear_core::{AccountId, CouponId, OrderId, ProductId, percentage, quantize};

/// Order row as the panel sees it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminOrder {
    pub id: OrderId,
    pub account_id: Option<AccountId>,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub paid: bool,
    pub payment_reference: Option<String>,
    pub coupon_id: Option<CouponId>,
    pub discount_percent: i32,
}

/// One frozen line of an order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminOrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl AdminOrderLine {
    /// `unit_price * quantity`, unrounded.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Detail view: order, lines, derived totals, processor link.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOrderDetail {
    #[serde(flatten)]
    pub order: AdminOrder,
    pub lines: Vec<AdminOrderLine>,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_before_discount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    /// Processor dashboard link, present once the order settled.
    pub payment_dashboard_url: Option<String>,
}

impl AdminOrderDetail {
    /// Assemble the detail view from an order and its lines.
    #[must_use]
    pub fn assemble(order: AdminOrder, lines: Vec<AdminOrderLine>, test_mode: bool) -> Self {
        let total_before_discount: Decimal = lines.iter().map(AdminOrderLine::line_total).sum();
        let percent = u8::try_from(order.discount_percent.clamp(0, 100)).unwrap_or(0);
        let discount_amount = if percent == 0 {
            Decimal::ZERO
        } else {
            quantize(percentage(total_before_discount, percent))
        };
        let total = quantize(total_before_discount - discount_amount);

        let payment_dashboard_url = order.payment_reference.as_deref().map(|reference| {
            let path = if test_mode { "/test/" } else { "/" };
            format!("https://dashboard.stripe.com{path}payments/{reference}")
        });

        Self {
            order,
            lines,
            total_before_discount,
            discount_amount,
            total,
            payment_dashboard_url,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn order(discount_percent: i32, reference: Option<&str>) -> AdminOrder {
        AdminOrder {
            id: OrderId::new(1),
            account_id: None,
            name: "Grace".to_owned(),
            last_name: "Hopper".to_owned(),
            email: "grace@example.com".to_owned(),
            city: "Arlington".to_owned(),
            created_at: Utc::now(),
            paid: reference.is_some(),
            payment_reference: reference.map(str::to_owned),
            coupon_id: None,
            discount_percent,
        }
    }

    #[test]
    fn test_detail_totals_match_storefront_arithmetic() {
        let lines = vec![
            AdminOrderLine {
                product_id: ProductId::new(1),
                product_name: "a".to_owned(),
                unit_price: d("19.99"),
                quantity: 2,
            },
            AdminOrderLine {
                product_id: ProductId::new(2),
                product_name: "b".to_owned(),
                unit_price: d("5.00"),
                quantity: 1,
            },
        ];

        let detail = AdminOrderDetail::assemble(order(10, None), lines, true);
        assert_eq!(detail.total_before_discount, d("44.98"));
        assert_eq!(detail.discount_amount, d("4.50"));
        assert_eq!(detail.total, d("40.48"));
    }

    #[test]
    fn test_dashboard_url_only_when_settled() {
        let detail = AdminOrderDetail::assemble(order(0, None), Vec::new(), true);
        assert!(detail.payment_dashboard_url.is_none());

        let detail = AdminOrderDetail::assemble(order(0, Some("pi_9")), Vec::new(), false);
        assert_eq!(
            detail.payment_dashboard_url.as_deref(),
            Some("https://dashboard.stripe.com/payments/pi_9")
        );
    }
}
