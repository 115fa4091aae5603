//! Role-based authorization for the staff panel.
//!
//! Every entry point calls [`authorize`] (usually through [`require`])
//! with the resource it is about to touch. The policy is a total function
//! from (actor, resource) to a tagged decision - handlers never branch on
//! raw role strings.

use tower_sessions::Session;

use prickly_pear_core::{AccessDecision, StaffRole};

use crate::error::AppError;
use crate::models::{CurrentStaff, session_keys};

/// A protected area of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Analytics dashboard and metrics.
    Dashboard,
    /// Inventory screens and stock adjustments.
    Inventory,
    /// Order list and detail.
    Orders,
    /// Supplier aggregates.
    Suppliers,
}

/// Decide whether `actor` may touch `resource`.
#[must_use]
pub fn authorize(actor: Option<&CurrentStaff>, resource: Resource) -> AccessDecision {
    let Some(staff) = actor else {
        return AccessDecision::NeedsAuth;
    };

    let allowed = match resource {
        Resource::Inventory => matches!(staff.role, StaffRole::Warehouse | StaffRole::Management),
        Resource::Orders => matches!(staff.role, StaffRole::Sales | StaffRole::Management),
        Resource::Dashboard | Resource::Suppliers => {
            matches!(staff.role, StaffRole::Management)
        }
    };

    if allowed {
        AccessDecision::Allowed
    } else {
        AccessDecision::Forbidden
    }
}

/// Fetch the signed-in staff member from the session, if any.
pub async fn current_staff(session: &Session) -> Option<CurrentStaff> {
    session
        .get::<CurrentStaff>(session_keys::CURRENT_STAFF)
        .await
        .ok()
        .flatten()
}

/// Resolve the session and run the policy, mapping the decision onto the
/// error taxonomy. Handlers call this first and get the actor back.
///
/// # Errors
///
/// `AppError::Unauthorized` when nobody is signed in;
/// `AppError::Forbidden` when the role does not cover the resource.
pub async fn require(session: &Session, resource: Resource) -> Result<CurrentStaff, AppError> {
    let staff = current_staff(session).await;

    match authorize(staff.as_ref(), resource) {
        AccessDecision::Allowed => {
            // Allowed implies an actor is present.
            staff.ok_or_else(|| AppError::Internal("actor vanished after authorize".to_owned()))
        }
        AccessDecision::NeedsAuth => Err(AppError::Unauthorized("sign in required".to_owned())),
        AccessDecision::Forbidden => Err(AppError::Forbidden(
            "your role does not cover this section".to_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prickly_pear_core::{AccountId, Email};

    fn staff(role: StaffRole) -> CurrentStaff {
        CurrentStaff {
            id: AccountId::new(1),
            email: Email::parse("staff@pricklypear.shop").expect("valid email"),
            role,
        }
    }

    #[test]
    fn test_anonymous_needs_auth_everywhere() {
        for resource in [
            Resource::Dashboard,
            Resource::Inventory,
            Resource::Orders,
            Resource::Suppliers,
        ] {
            assert_eq!(authorize(None, resource), AccessDecision::NeedsAuth);
        }
    }

    #[test]
    fn test_warehouse_covers_inventory_only() {
        let actor = staff(StaffRole::Warehouse);
        assert_eq!(
            authorize(Some(&actor), Resource::Inventory),
            AccessDecision::Allowed
        );
        assert_eq!(
            authorize(Some(&actor), Resource::Orders),
            AccessDecision::Forbidden
        );
        assert_eq!(
            authorize(Some(&actor), Resource::Dashboard),
            AccessDecision::Forbidden
        );
    }

    #[test]
    fn test_sales_covers_orders_only() {
        let actor = staff(StaffRole::Sales);
        assert_eq!(
            authorize(Some(&actor), Resource::Orders),
            AccessDecision::Allowed
        );
        assert_eq!(
            authorize(Some(&actor), Resource::Inventory),
            AccessDecision::Forbidden
        );
    }

    #[test]
    fn test_management_covers_everything() {
        let actor = staff(StaffRole::Management);
        for resource in [
            Resource::Dashboard,
            Resource::Inventory,
            Resource::Orders,
            Resource::Suppliers,
        ] {
            assert_eq!(authorize(Some(&actor), resource), AccessDecision::Allowed);
        }
    }
}
