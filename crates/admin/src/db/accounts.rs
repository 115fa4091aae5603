//! Staff account lookups for panel sign-in.

use sqlx::PgPool;

use prickly_pear_core::{AccountId, Email, StaffRole};

use super::RepositoryError;
use crate::models::CurrentStaff;

#[derive(sqlx::FromRow)]
struct StaffRow {
    id: i32,
    email: String,
    staff_role: Option<String>,
    password_hash: Option<String>,
}

/// Repository for staff sign-in.
pub struct StaffRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StaffRepository<'a> {
    /// Create a new staff repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a staff member and their password hash by email.
    ///
    /// Customer accounts are invisible here: the panel only signs in
    /// accounts of kind `staff` that carry a role and a password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values fail to parse.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(CurrentStaff, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, StaffRow>(
            "SELECT a.id, a.email, a.staff_role, p.password_hash \
             FROM shop.account a \
             LEFT JOIN shop.account_password p ON p.account_id = a.id \
             WHERE a.email = $1 AND a.kind = 'staff'",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let (Some(role), Some(password_hash)) = (row.staff_role, row.password_hash) else {
            return Ok(None);
        };

        let role = StaffRole::from_str_opt(&role).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("unknown staff role: {role}"))
        })?;
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Some((
            CurrentStaff {
                id: AccountId::new(row.id),
                email,
                role,
            },
            password_hash,
        )))
    }
}
