//! Account repository for the storefront.
//!
//! Handles customer registration and login lookups. Staff management lives
//! in the admin binary; this side only ever creates customer accounts.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use prickly_pear_core::{AccountId, AccountKind, Email, StaffRole};

use super::RepositoryError;
use crate::models::Account;

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i32,
    email: String,
    kind: String,
    staff_role: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> Result<Account, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let kind = AccountKind::from_str_opt(&self.kind).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("unknown account kind: {}", self.kind))
        })?;

        let staff_role = match self.staff_role.as_deref() {
            Some(role) => Some(StaffRole::from_str_opt(role).ok_or_else(|| {
                RepositoryError::DataCorruption(format!("unknown staff role: {role}"))
            })?),
            None => None,
        };

        Ok(Account {
            id: AccountId::new(self.id),
            email,
            kind,
            staff_role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, kind, staff_role, created_at, updated_at";

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an account by its email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values fail to parse.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM shop.account WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(AccountRow::into_account).transpose()
    }

    /// Get an account by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values fail to parse.
    pub async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM shop.account WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(AccountRow::into_account).transpose()
    }

    /// Create a customer account with a password, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_customer(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<Account, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "INSERT INTO shop.account (email, kind) VALUES ($1, 'customer') \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(email.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        let account = row.into_account()?;

        sqlx::query(
            "INSERT INTO shop.account_password (account_id, password_hash) VALUES ($1, $2)",
        )
        .bind(account.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(account)
    }

    /// Get an account and its password hash by email.
    ///
    /// Returns `None` if the account doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values fail to parse.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct WithHash {
            #[sqlx(flatten)]
            account: AccountRow,
            password_hash: Option<String>,
        }

        let row = sqlx::query_as::<_, WithHash>(
            "SELECT a.id, a.email, a.kind, a.staff_role, a.created_at, a.updated_at, \
                    p.password_hash \
             FROM shop.account a \
             LEFT JOIN shop.account_password p ON p.account_id = a.id \
             WHERE a.email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let Some(password_hash) = row.password_hash else {
            return Ok(None);
        };

        Ok(Some((row.account.into_account()?, password_hash)))
    }
}
