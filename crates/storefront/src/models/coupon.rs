//! Coupon domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prickly_pear_core::CouponId;

/// A time-bounded percentage discount code.
///
/// Coupons are created and deactivated by staff; the storefront only ever
/// reads them. Orders copy `discount_percent` at creation time, so editing
/// or deleting a coupon never changes a historical order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Coupon {
    /// Unique coupon ID.
    pub id: CouponId,
    /// Redemption code. Unique, compared case-insensitively.
    pub code: String,
    /// Start of the validity window (inclusive).
    pub valid_from: DateTime<Utc>,
    /// End of the validity window (inclusive).
    pub valid_until: DateTime<Utc>,
    /// Discount in whole percent, 0-100.
    pub discount_percent: i32,
    /// Kill switch; an inactive coupon is never redeemable.
    pub active: bool,
}

impl Coupon {
    /// Whether the coupon can be redeemed at `now`.
    ///
    /// Both window bounds are inclusive.
    #[must_use]
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.valid_from <= now && now <= self.valid_until
    }

    /// Discount percent as a `u8` for money arithmetic.
    #[must_use]
    pub fn percent(&self) -> u8 {
        u8::try_from(self.discount_percent.clamp(0, 100)).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn coupon(active: bool, from: DateTime<Utc>, until: DateTime<Utc>) -> Coupon {
        Coupon {
            id: CouponId::new(1),
            code: "SUMMER10".to_owned(),
            valid_from: from,
            valid_until: until,
            discount_percent: 10,
            active,
        }
    }

    #[test]
    fn test_redeemable_window_is_inclusive() {
        let from = Utc::now();
        let until = from + TimeDelta::days(7);
        let c = coupon(true, from, until);

        assert!(c.is_redeemable_at(from));
        assert!(c.is_redeemable_at(until));
        assert!(c.is_redeemable_at(from + TimeDelta::days(3)));
        assert!(!c.is_redeemable_at(from - TimeDelta::seconds(1)));
        assert!(!c.is_redeemable_at(until + TimeDelta::seconds(1)));
    }

    #[test]
    fn test_inactive_coupon_never_redeemable() {
        let from = Utc::now();
        let until = from + TimeDelta::days(7);
        let c = coupon(false, from, until);

        assert!(!c.is_redeemable_at(from + TimeDelta::days(1)));
    }
}
