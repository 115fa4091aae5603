//! Order domain models.
//!
//! An order is a persisted snapshot of a checkout: line prices and the
//! coupon discount percent are copied at creation time and never re-read
//! from the live catalog or coupon tables. The `paid` flag is monotonic -
//! it moves false to true exactly once, via a conditional update in the
//! repository, and never back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use prickly_pear_core::{AccountId, CouponId, OrderId, ProductId, percentage, quantize};

/// A persisted order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Owning account. `None` for guest checkouts (may be back-filled when
    /// the payment settles and the payer email matches an account).
    pub account_id: Option<AccountId>,
    /// Customer first name.
    pub name: String,
    /// Customer last name.
    pub last_name: String,
    /// Second last name, optional.
    pub second_last_name: Option<String>,
    /// Contact email. For authenticated checkouts this is the account
    /// email, which overrides whatever the form carried.
    pub email: String,
    /// Shipping address.
    pub address: String,
    /// Postal code.
    pub postal_code: String,
    /// City.
    pub city: String,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
    /// Whether payment has settled. False to true only.
    pub paid: bool,
    /// External payment processor reference. Set once, on settlement.
    pub payment_reference: Option<String>,
    /// Coupon that was applied at checkout, if any.
    pub coupon_id: Option<CouponId>,
    /// Discount percent copied from the coupon at creation time.
    pub discount_percent: i32,
}

impl Order {
    /// Discount percent as a `u8` for money arithmetic.
    #[must_use]
    pub fn percent(&self) -> u8 {
        u8::try_from(self.discount_percent.clamp(0, 100)).unwrap_or(0)
    }

    /// Payment processor dashboard URL for this order, if it has settled.
    ///
    /// Test-mode keys get the `/test/` dashboard path.
    #[must_use]
    pub fn payment_dashboard_url(&self, test_mode: bool) -> Option<String> {
        let reference = self.payment_reference.as_deref()?;
        let path = if test_mode { "/test/" } else { "/" };
        Some(format!(
            "https://dashboard.stripe.com{path}payments/{reference}"
        ))
    }
}

/// One product's frozen price and quantity within an order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderLineView {
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Product display name at read time (for receipts and the processor).
    pub product_name: String,
    /// Unit price frozen at order creation.
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
    /// Units ordered.
    pub quantity: i32,
}

impl OrderLineView {
    /// `unit_price * quantity`, unrounded.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// An order together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithLines {
    /// The order row.
    pub order: Order,
    /// Frozen line items.
    pub lines: Vec<OrderLineView>,
}

impl OrderWithLines {
    /// Sum of line totals, unrounded.
    #[must_use]
    pub fn total_before_discount(&self) -> Decimal {
        self.lines.iter().map(OrderLineView::line_total).sum()
    }

    /// Discount amount from the frozen percent, quantized for presentation.
    #[must_use]
    pub fn discount_amount(&self) -> Decimal {
        if self.order.discount_percent == 0 {
            return Decimal::ZERO;
        }
        quantize(percentage(self.total_before_discount(), self.order.percent()))
    }

    /// Final order total: subtotal minus discount, quantized half-up.
    #[must_use]
    pub fn total(&self) -> Decimal {
        quantize(self.total_before_discount() - self.discount_amount())
    }

    /// Product ids across all lines, in line order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|line| line.product_id).collect()
    }
}

/// Input for creating a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Owning account, when the shopper was authenticated.
    pub account_id: Option<AccountId>,
    /// Customer first name.
    pub name: String,
    /// Customer last name.
    pub last_name: String,
    /// Second last name, optional.
    pub second_last_name: Option<String>,
    /// Contact email (already validated).
    pub email: String,
    /// Shipping address.
    pub address: String,
    /// Postal code.
    pub postal_code: String,
    /// City.
    pub city: String,
    /// Coupon applied at checkout, if still redeemable.
    pub coupon_id: Option<CouponId>,
    /// Discount percent snapshotted from that coupon (0 without one).
    pub discount_percent: i32,
}

/// Input for one order line, snapshotted from a cart entry.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    /// Product the line refers to.
    pub product_id: ProductId,
    /// Cart-snapshotted unit price (never the live product price).
    pub unit_price: Decimal,
    /// Units ordered.
    pub quantity: i32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn order(discount_percent: i32) -> Order {
        Order {
            id: OrderId::new(1),
            account_id: None,
            name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            second_last_name: None,
            email: "ada@example.com".to_owned(),
            address: "1 Analytical Way".to_owned(),
            postal_code: "28001".to_owned(),
            city: "Madrid".to_owned(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            paid: false,
            payment_reference: None,
            coupon_id: None,
            discount_percent,
        }
    }

    fn line(product_id: i32, unit_price: &str, quantity: i32) -> OrderLineView {
        OrderLineView {
            product_id: ProductId::new(product_id),
            product_name: format!("product {product_id}"),
            unit_price: d(unit_price),
            quantity,
        }
    }

    #[test]
    fn test_totals_without_discount() {
        let order = OrderWithLines {
            order: order(0),
            lines: vec![line(1, "19.99", 2), line(2, "5.00", 1)],
        };
        assert_eq!(order.total_before_discount(), d("44.98"));
        assert_eq!(order.discount_amount(), Decimal::ZERO);
        assert_eq!(order.total(), d("44.98"));
    }

    #[test]
    fn test_totals_with_snapshotted_discount() {
        let order = OrderWithLines {
            order: order(10),
            lines: vec![line(1, "19.99", 2), line(2, "5.00", 1)],
        };
        assert_eq!(order.discount_amount(), d("4.50"));
        assert_eq!(order.total(), d("40.48"));
    }

    #[test]
    fn test_total_rounds_half_up() {
        let order = OrderWithLines {
            order: order(15),
            lines: vec![line(1, "0.99", 3)],
        };
        // 2.97 - quantize(0.4455) = 2.97 - 0.45 = 2.52
        assert_eq!(order.discount_amount(), d("0.45"));
        assert_eq!(order.total(), d("2.52"));
    }

    #[test]
    fn test_payment_dashboard_url() {
        let mut o = order(0);
        assert_eq!(o.payment_dashboard_url(true), None);

        o.payment_reference = Some("pi_123".to_owned());
        assert_eq!(
            o.payment_dashboard_url(true).unwrap(),
            "https://dashboard.stripe.com/test/payments/pi_123"
        );
        assert_eq!(
            o.payment_dashboard_url(false).unwrap(),
            "https://dashboard.stripe.com/payments/pi_123"
        );
    }
}
