//! Domain models for the storefront.

pub mod coupon;
pub mod order;
pub mod product;
pub mod user;

pub use coupon::Coupon;
pub use order::{NewOrder, NewOrderLine, Order, OrderLineView, OrderWithLines};
pub use product::{Category, Product};
pub use user::{Account, CurrentUser};

/// Session storage keys.
///
/// Centralized so cart, auth, and checkout code agree on the names.
pub mod session_keys {
    /// Serialized [`crate::cart::Cart`] for this visitor.
    pub const CART: &str = "cart";
    /// The authenticated customer, if any.
    pub const CURRENT_USER: &str = "current_user";
    /// Order awaiting payment after checkout.
    pub const PENDING_ORDER: &str = "pending_order";
}
