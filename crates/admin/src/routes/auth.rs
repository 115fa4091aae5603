//! Staff sign-in and sign-out.

use argon2::password_hash::{PasswordHash, PasswordVerifier};
use argon2::Argon2;
use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use prickly_pear_core::Email;

use crate::db::StaffRepository;
use crate::error::{AppError, Result};
use crate::models::{CurrentStaff, session_keys};
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Credentials request body.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// POST /auth/login - staff sign-in.
///
/// Customer accounts cannot sign in here, and the response does not reveal
/// whether the email or the password was at fault.
#[instrument(skip(state, session, form))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<CurrentStaff>> {
    let invalid = || AppError::Unauthorized("invalid credentials".to_owned());

    let email = Email::parse(&form.email).map_err(|_| invalid())?;

    let Some((staff, stored_hash)) = StaffRepository::new(state.pool())
        .get_with_password_hash(&email)
        .await?
    else {
        return Err(invalid());
    };

    if !verify_password(form.password.expose_secret(), &stored_hash) {
        return Err(invalid());
    }

    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_STAFF, &staff)
        .await?;

    Ok(Json(staff))
}

/// POST /auth/logout - drop the signed-in staff member.
#[instrument(skip(session))]
async fn logout(session: Session) -> Result<StatusCode> {
    session
        .remove::<CurrentStaff>(session_keys::CURRENT_STAFF)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
