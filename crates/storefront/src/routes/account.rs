//! Customer account routes: register, login, logout.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use prickly_pear_core::Email;

use crate::db::{AccountRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::{CurrentUser, session_keys};
use crate::services::auth::{self, AuthError};
use crate::state::AppState;

/// Build the account router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/account/register", post(register))
        .route("/account/login", post(login))
        .route("/account/logout", post(logout))
        .route("/account/me", get(me))
}

/// Credentials request body, shared by register and login.
#[derive(Deserialize)]
pub struct CredentialsForm {
    pub email: String,
    pub password: SecretString,
}

impl std::fmt::Debug for CredentialsForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Fetch the authenticated visitor from the session, if any.
pub async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// POST /account/register - create a customer account and sign in.
#[instrument(skip(state, session, form))]
async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CredentialsForm>,
) -> Result<(StatusCode, Json<CurrentUser>)> {
    let email = Email::parse(&form.email).map_err(AuthError::InvalidEmail)?;
    let password_hash = auth::hash_password(form.password.expose_secret())?;

    let account = AccountRepository::new(state.pool())
        .create_customer(&email, &password_hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::Auth(AuthError::AccountAlreadyExists),
            other => AppError::Database(other),
        })?;

    let user = CurrentUser::from(&account);
    session.insert(session_keys::CURRENT_USER, &user).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /account/login - verify credentials and sign in.
#[instrument(skip(state, session, form))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CredentialsForm>,
) -> Result<Json<CurrentUser>> {
    let email = Email::parse(&form.email).map_err(|_| AuthError::InvalidCredentials)?;

    let Some((account, stored_hash)) = AccountRepository::new(state.pool())
        .get_with_password_hash(&email)
        .await?
    else {
        return Err(AuthError::InvalidCredentials.into());
    };

    if !auth::verify_password(form.password.expose_secret(), &stored_hash) {
        return Err(AuthError::InvalidCredentials.into());
    }

    // Rotate the session id on privilege change.
    session.cycle_id().await?;

    let user = CurrentUser::from(&account);
    session.insert(session_keys::CURRENT_USER, &user).await?;

    Ok(Json(user))
}

/// POST /account/logout - drop the signed-in user.
#[instrument(skip(session))]
async fn logout(session: Session) -> Result<StatusCode> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /account/me - who am I.
#[instrument(skip(session))]
async fn me(session: Session) -> Result<Json<CurrentUser>> {
    current_user(&session)
        .await
        .map(Json)
        .ok_or_else(|| AppError::Unauthorized("not signed in".to_owned()))
}
