//! Session-scoped shopping cart.
//!
//! The cart is a plain serializable value object, loaded from and written
//! back to the visitor's session explicitly - it is never ambient state.
//! Entry keys are the product id as a string because the session layer
//! round-trips the cart through JSON, and unit prices ride along as decimal
//! strings so nothing degrades to a binary float on the way.
//!
//! Mutation methods only touch the in-memory value; callers persist with
//! [`save`], which is the session layer's "modified" signal.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use prickly_pear_core::{CouponId, ProductId, percentage, quantize};

use crate::db::{CouponRepository, ProductRepository, RepositoryError};
use crate::models::{Coupon, Product, session_keys};

/// One product's snapshot in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Units selected. Always at least 1 while the entry exists; a removal
    /// deletes the entry instead of zeroing it.
    pub quantity: u32,
    /// Unit price snapshotted when the product was first added.
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
}

/// The visitor's cart: product entries plus an optional attached coupon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    entries: BTreeMap<String, CartEntry>,
    coupon_id: Option<CouponId>,
}

impl Cart {
    /// Add a product, snapshotting its current price on first add.
    ///
    /// With `replace` the entry's quantity becomes `quantity`; otherwise it
    /// is incremented. A product that was removed and re-added gets a fresh
    /// snapshot of the *current* price, not the one it had before.
    pub fn add(&mut self, product: &Product, quantity: u32, replace: bool) {
        let entry = self
            .entries
            .entry(product.id.to_string())
            .or_insert_with(|| CartEntry {
                quantity: 0,
                unit_price: product.price,
            });

        if replace {
            entry.quantity = quantity;
        } else {
            entry.quantity += quantity;
        }
    }

    /// Remove a product. Returns whether an entry was actually deleted;
    /// removing an absent product is a no-op, not an error.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        self.entries.remove(&product_id.to_string()).is_some()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total units across all entries.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.entries.values().map(|entry| entry.quantity).sum()
    }

    /// Sum of `unit_price * quantity` over all entries, unrounded.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.entries
            .values()
            .map(|entry| entry.unit_price * Decimal::from(entry.quantity))
            .sum()
    }

    /// Attach a coupon id. Validity is re-checked on every read, not here.
    pub fn set_coupon(&mut self, coupon_id: Option<CouponId>) {
        self.coupon_id = coupon_id;
    }

    /// The attached coupon id, if any. May point at a coupon that has since
    /// expired - resolve through [`Cart::attached_coupon`].
    #[must_use]
    pub const fn coupon_id(&self) -> Option<CouponId> {
        self.coupon_id
    }

    /// Product ids currently in the cart.
    ///
    /// Keys that fail to parse are skipped; they cannot have been written
    /// by [`Cart::add`].
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.entries
            .keys()
            .filter_map(|key| key.parse::<i32>().ok().map(ProductId::new))
            .collect()
    }

    /// Snapshot entry for a product, if present.
    #[must_use]
    pub fn entry(&self, product_id: ProductId) -> Option<&CartEntry> {
        self.entries.get(&product_id.to_string())
    }

    /// Resolve the attached coupon, re-validating it against `now`.
    ///
    /// Returns `None` when no coupon is attached *or* the attached one is
    /// no longer redeemable - a stale id silently yields no discount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the lookup fails.
    pub async fn attached_coupon(
        &self,
        coupons: &CouponRepository<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<Coupon>, RepositoryError> {
        match self.coupon_id {
            Some(id) => coupons.get_redeemable(id, now).await,
            None => Ok(None),
        }
    }

    /// Resolve cart entries to live products with line totals.
    ///
    /// One batched lookup for the whole id set. Products that no longer
    /// exist are silently skipped; the survivors keep their snapshot price,
    /// not the live one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the lookup fails.
    pub async fn hydrate(
        &self,
        products: &ProductRepository<'_>,
    ) -> Result<Vec<CartItem>, RepositoryError> {
        let found = products.get_by_ids(&self.product_ids()).await?;

        let mut items: Vec<CartItem> = found
            .into_iter()
            .filter_map(|product| {
                self.entry(product.id).map(|entry| CartItem {
                    quantity: entry.quantity,
                    unit_price: entry.unit_price,
                    line_total: entry.unit_price * Decimal::from(entry.quantity),
                    product,
                })
            })
            .collect();
        items.sort_by_key(|item| item.product.id);

        Ok(items)
    }
}

/// A hydrated cart entry: the live product plus the snapshot arithmetic.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    /// The live product row.
    pub product: Product,
    /// Units selected.
    pub quantity: u32,
    /// Snapshot unit price.
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
    /// `unit_price * quantity`, unrounded.
    #[serde(with = "rust_decimal::serde::str")]
    pub line_total: Decimal,
}

/// Cart money totals for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    /// Unrounded sum of line totals.
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    /// Unrounded discount amount; exactly zero without a redeemable coupon.
    #[serde(with = "rust_decimal::serde::str")]
    pub discount: Decimal,
    /// `quantize(subtotal - discount)` - the only rounded figure.
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

impl CartTotals {
    /// Compute totals for a subtotal and an optional redeemable coupon.
    #[must_use]
    pub fn compute(subtotal: Decimal, coupon: Option<&Coupon>) -> Self {
        let discount = coupon.map_or(Decimal::ZERO, |coupon| {
            percentage(subtotal, coupon.percent())
        });

        Self {
            subtotal,
            discount,
            total: quantize(subtotal - discount),
        }
    }
}

/// Load the cart from the session, or an empty one.
///
/// A session read failure degrades to an empty cart: the visitor sees an
/// empty cart rather than an error page, matching how an expired session
/// behaves anyway.
pub async fn load(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Persist the cart into the session.
///
/// Every mutation must be followed by this call; inserting the value is
/// what marks the session modified so the store writes it out.
///
/// # Errors
///
/// Returns the session store error if persistence fails.
pub async fn save(
    session: &Session,
    cart: &Cart,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Drop the whole cart from the session (post-checkout).
///
/// # Errors
///
/// Returns the session store error if persistence fails.
pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<Cart>(session_keys::CART).await.map(|_| ())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use prickly_pear_core::{CategoryId, SupplierId};

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn product(id: i32, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            supplier_id: SupplierId::new(1),
            name: format!("product {id}"),
            slug: format!("product-{id}"),
            description: String::new(),
            price: d(price),
            stock: 100,
            stock_minimum: 10,
            available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn coupon(percent: i32) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: CouponId::new(1),
            code: "TEN".to_owned(),
            valid_from: now - TimeDelta::days(1),
            valid_until: now + TimeDelta::days(1),
            discount_percent: percent,
            active: true,
        }
    }

    #[test]
    fn test_add_increments_quantity() {
        let mut cart = Cart::default();
        let p = product(1, "19.99");

        cart.add(&p, 2, false);
        cart.add(&p, 3, false);

        assert_eq!(cart.entry(p.id).unwrap().quantity, 5);
        assert_eq!(cart.count(), 5);
    }

    #[test]
    fn test_add_with_replace_sets_quantity() {
        let mut cart = Cart::default();
        let p = product(1, "19.99");

        cart.add(&p, 2, false);
        cart.add(&p, 3, false);
        cart.add(&p, 1, true);

        assert_eq!(cart.entry(p.id).unwrap().quantity, 1);
    }

    #[test]
    fn test_add_snapshots_price_on_first_add_only() {
        let mut cart = Cart::default();
        let mut p = product(1, "19.99");

        cart.add(&p, 1, false);
        p.price = d("24.99");
        cart.add(&p, 1, false);

        // Still the price from the first add.
        assert_eq!(cart.entry(p.id).unwrap().unit_price, d("19.99"));
    }

    #[test]
    fn test_readd_after_remove_resnapshots_current_price() {
        let mut cart = Cart::default();
        let mut p = product(1, "19.99");

        cart.add(&p, 1, false);
        assert!(cart.remove(p.id));

        p.price = d("24.99");
        cart.add(&p, 1, false);

        assert_eq!(cart.entry(p.id).unwrap().unit_price, d("24.99"));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::default();
        assert!(!cart.remove(ProductId::new(99)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_subtotal_is_unrounded() {
        let mut cart = Cart::default();
        cart.add(&product(1, "19.99"), 2, false);
        cart.add(&product(2, "5.00"), 1, false);

        assert_eq!(cart.subtotal(), d("44.98"));
    }

    #[test]
    fn test_totals_without_coupon_equal_subtotal() {
        let mut cart = Cart::default();
        cart.add(&product(1, "19.99"), 2, false);

        let totals = CartTotals::compute(cart.subtotal(), None);
        assert_eq!(totals.discount, Decimal::ZERO);
        assert_eq!(totals.total, d("39.98"));
    }

    #[test]
    fn test_totals_with_coupon_round_half_up_once() {
        let mut cart = Cart::default();
        cart.add(&product(1, "19.99"), 2, false);
        cart.add(&product(2, "5.00"), 1, false);

        let ten = coupon(10);
        let totals = CartTotals::compute(cart.subtotal(), Some(&ten));

        // Discount stays raw; only the final total is quantized.
        assert_eq!(totals.subtotal, d("44.98"));
        assert_eq!(totals.discount, d("4.498"));
        assert_eq!(totals.total, d("40.48"));
    }

    #[test]
    fn test_total_never_exceeds_subtotal() {
        let mut cart = Cart::default();
        cart.add(&product(1, "12.34"), 3, false);
        let subtotal = cart.subtotal();

        for percent in [0, 1, 10, 50, 100] {
            let c = coupon(percent);
            let totals = CartTotals::compute(subtotal, Some(&c));
            assert!(totals.total <= subtotal, "percent {percent}");
        }
    }

    #[test]
    fn test_cart_serde_roundtrip_keeps_exact_prices() {
        let mut cart = Cart::default();
        cart.add(&product(1, "19.99"), 2, false);
        cart.set_coupon(Some(CouponId::new(7)));

        let json = serde_json::to_string(&cart).unwrap();
        let back: Cart = serde_json::from_str(&json).unwrap();

        assert_eq!(back.entry(ProductId::new(1)).unwrap().unit_price, d("19.99"));
        assert_eq!(back.coupon_id(), Some(CouponId::new(7)));
        // Prices are strings on the wire, not floats.
        assert!(json.contains("\"19.99\""));
    }

    #[test]
    fn test_product_ids() {
        let mut cart = Cart::default();
        cart.add(&product(3, "1.00"), 1, false);
        cart.add(&product(1, "1.00"), 1, false);

        let mut ids = cart.product_ids();
        ids.sort();
        assert_eq!(ids, vec![ProductId::new(1), ProductId::new(3)]);
    }
}
