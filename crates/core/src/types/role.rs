//! Account kinds, staff roles, and authorization outcomes.

use serde::{Deserialize, Serialize};

/// Whether an account belongs to a shopper or to shop staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Customer,
    Staff,
}

impl AccountKind {
    /// Stable string form used in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
        }
    }

    /// Parse the database string form.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(Self::Customer),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }
}

/// Role of a staff account inside the internal panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Warehouse,
    Sales,
    Management,
}

impl StaffRole {
    /// Stable string form used in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warehouse => "warehouse",
            Self::Sales => "sales",
            Self::Management => "management",
        }
    }

    /// Parse the database string form.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "warehouse" => Some(Self::Warehouse),
            "sales" => Some(Self::Sales),
            "management" => Some(Self::Management),
            _ => None,
        }
    }
}

/// Outcome of an authorization check.
///
/// Every internal entry point calls a policy function returning one of
/// these instead of branching on loosely-typed user attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The actor may perform the operation.
    Allowed,
    /// No authenticated actor; the caller should ask for credentials.
    NeedsAuth,
    /// The actor is authenticated but lacks the required role.
    Forbidden,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_string_roundtrip() {
        for role in [StaffRole::Warehouse, StaffRole::Sales, StaffRole::Management] {
            assert_eq!(StaffRole::from_str_opt(role.as_str()), Some(role));
        }
        assert_eq!(StaffRole::from_str_opt("intern"), None);
    }

    #[test]
    fn test_kind_string_roundtrip() {
        for kind in [AccountKind::Customer, AccountKind::Staff] {
            assert_eq!(AccountKind::from_str_opt(kind.as_str()), Some(kind));
        }
    }
}
