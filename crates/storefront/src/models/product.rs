//! Catalog domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use prickly_pear_core::{CategoryId, ProductId, SupplierId};

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// URL-safe identifier, unique.
    pub slug: String,
    /// Whether the category is shown on the storefront.
    pub active: bool,
}

/// A product in the catalog.
///
/// `price` is the *live* price. Cart entries and order lines snapshot it at
/// add-time / order-creation time and never read it back.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Category this product belongs to.
    pub category_id: CategoryId,
    /// Supplier this product is sourced from.
    pub supplier_id: SupplierId,
    /// Display name.
    pub name: String,
    /// URL-safe identifier.
    pub slug: String,
    /// Free-text description.
    pub description: String,
    /// Current unit price.
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    /// Units on hand. May go negative; the stock ledger records whatever
    /// delta it is given and callers own the floor rule.
    pub stock: i32,
    /// Threshold at or below which the product needs restocking.
    pub stock_minimum: i32,
    /// Whether the product is purchasable on the storefront.
    pub available: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether stock has fallen to or below the restock threshold.
    #[must_use]
    pub const fn needs_restock(&self) -> bool {
        self.stock <= self.stock_minimum
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(stock: i32, stock_minimum: i32) -> Product {
        Product {
            id: ProductId::new(1),
            category_id: CategoryId::new(1),
            supplier_id: SupplierId::new(1),
            name: "Mechanical keyboard".to_owned(),
            slug: "mechanical-keyboard".to_owned(),
            description: String::new(),
            price: "59.90".parse().unwrap(),
            stock,
            stock_minimum,
            available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_needs_restock_at_or_below_minimum() {
        assert!(product(5, 10).needs_restock());
        assert!(product(10, 10).needs_restock());
        assert!(!product(11, 10).needs_restock());
    }

    #[test]
    fn test_price_serializes_as_decimal_string() {
        let json = serde_json::to_value(product(1, 1)).unwrap();
        assert_eq!(json["price"], serde_json::json!("59.90"));
    }
}
