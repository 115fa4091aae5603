//! Account domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prickly_pear_core::{AccountId, AccountKind, Email, StaffRole};

/// A shopper or staff account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,
    /// Login email, unique.
    pub email: Email,
    /// Customer or staff.
    pub kind: AccountKind,
    /// Staff role, only meaningful for staff accounts.
    pub staff_role: Option<StaffRole>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Whether this is a customer account.
    #[must_use]
    pub fn is_customer(&self) -> bool {
        self.kind == AccountKind::Customer
    }
}

/// The authenticated visitor, as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Account ID.
    pub id: AccountId,
    /// Login email.
    pub email: Email,
    /// Customer or staff.
    pub kind: AccountKind,
}

impl From<&Account> for CurrentUser {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            kind: account.kind,
        }
    }
}
