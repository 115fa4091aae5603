//! Domain models for the staff panel.

pub mod inventory;
pub mod order;

pub use inventory::{MovementKind, MovementView, ProductRow, StockMovement};
pub use order::{AdminOrder, AdminOrderDetail, AdminOrderLine};

use serde::{Deserialize, Serialize};

use prickly_pear_core::{AccountId, Email, StaffRole};

/// The signed-in staff member, as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentStaff {
    /// Account ID.
    pub id: AccountId,
    /// Login email.
    pub email: Email,
    /// Panel role; decides which screens this member may touch.
    pub role: StaffRole,
}

/// Session storage keys.
pub mod session_keys {
    /// The authenticated staff member, if any.
    pub const CURRENT_STAFF: &str = "current_staff";
}
