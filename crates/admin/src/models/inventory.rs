//! Inventory models: product rows, movement kinds, the audit trail.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use prickly_pear_core::{AccountId, CategoryId, ProductId, StockMovementId, SupplierId};

/// Kind of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Goods received; the signed delta is positive.
    Inbound,
    /// Goods leaving; the signed delta is negative.
    Outbound,
    /// Manual correction; the delta keeps whatever sign it was given.
    Adjustment,
}

impl MovementKind {
    /// Stable string form used in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
            Self::Adjustment => "adjustment",
        }
    }

    /// Parse the database string form.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "inbound" => Some(Self::Inbound),
            "outbound" => Some(Self::Outbound),
            "adjustment" => Some(Self::Adjustment),
            _ => None,
        }
    }

    /// Apply this kind's sign convention to a positive magnitude.
    ///
    /// Adjustments pass the value through signed; inbound forces positive,
    /// outbound negative.
    #[must_use]
    pub const fn signed_delta(self, quantity: i32) -> i32 {
        match self {
            Self::Inbound => quantity.abs(),
            Self::Outbound => -quantity.abs(),
            Self::Adjustment => quantity,
        }
    }
}

/// One immutable audit record of a stock adjustment.
///
/// Rows are append-only: nothing in the codebase updates or deletes them.
#[derive(Debug, Clone, Serialize)]
pub struct StockMovement {
    /// Unique movement ID.
    pub id: StockMovementId,
    /// Product whose stock moved.
    pub product_id: ProductId,
    /// Movement kind.
    pub kind: MovementKind,
    /// Signed delta that was applied to the stock counter.
    pub quantity: i32,
    /// Free-text reason.
    pub reason: String,
    /// Reference code (delivery note, order number).
    pub reference: String,
    /// Staff member who made the adjustment, if known.
    pub account_id: Option<AccountId>,
    /// When the movement was recorded.
    pub created_at: DateTime<Utc>,
}

/// Movement joined with its product name, for list screens.
#[derive(Debug, Clone, Serialize)]
pub struct MovementView {
    /// The movement itself.
    #[serde(flatten)]
    pub movement: StockMovement,
    /// Product display name at read time.
    pub product_name: String,
}

/// Product row as the inventory screens see it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductRow {
    /// Unique product ID.
    pub id: ProductId,
    /// Category reference.
    pub category_id: CategoryId,
    /// Supplier reference.
    pub supplier_id: SupplierId,
    /// Display name.
    pub name: String,
    /// URL-safe identifier.
    pub slug: String,
    /// Current unit price.
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    /// Units on hand.
    pub stock: i32,
    /// Restock threshold.
    pub stock_minimum: i32,
    /// Whether the storefront sells it.
    pub available: bool,
}

impl ProductRow {
    /// Whether stock has fallen to or below the restock threshold.
    #[must_use]
    pub const fn needs_restock(&self) -> bool {
        self.stock <= self.stock_minimum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_delta_conventions() {
        assert_eq!(MovementKind::Inbound.signed_delta(5), 5);
        assert_eq!(MovementKind::Inbound.signed_delta(-5), 5);
        assert_eq!(MovementKind::Outbound.signed_delta(3), -3);
        assert_eq!(MovementKind::Outbound.signed_delta(-3), -3);
        assert_eq!(MovementKind::Adjustment.signed_delta(-7), -7);
        assert_eq!(MovementKind::Adjustment.signed_delta(7), 7);
    }

    #[test]
    fn test_kind_string_roundtrip() {
        for kind in [
            MovementKind::Inbound,
            MovementKind::Outbound,
            MovementKind::Adjustment,
        ] {
            assert_eq!(MovementKind::from_str_opt(kind.as_str()), Some(kind));
        }
        assert_eq!(MovementKind::from_str_opt("transfer"), None);
    }
}
