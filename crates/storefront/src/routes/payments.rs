//! Payment routes: start a checkout session, receive settlement webhooks.
//!
//! The webhook handler is the only writer of the paid flag. Its contract
//! under at-least-once delivery: signature failures never reach the state
//! machine, an unknown order is a distinct 404 outcome with no mutation,
//! a duplicate event is a 200 no-op, and the settlement side effects
//! (user back-fill, recommendation update, invoice job) run exactly once -
//! on the single event that wins the conditional paid transition.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use prickly_pear_core::{Email, OrderId};

use crate::db::{
    AccountRepository, MarkPaidOutcome, OrderRepository, RecommendationRepository,
};
use crate::error::{AppError, Result};
use crate::models::{OrderWithLines, session_keys};
use crate::payments::webhook::{
    self, CHECKOUT_COMPLETED, PAYMENT_INTENT_SUCCEEDED, WebhookEvent,
};
use crate::state::AppState;
use crate::tasks::Job;

/// Build the payments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout/pay", post(start_payment))
        .route("/checkout/completed", get(completed))
        .route("/checkout/cancelled", get(cancelled))
        .route("/webhooks/payments", post(handle_webhook))
}

/// Response carrying the processor-hosted payment page.
#[derive(Debug, Serialize)]
pub struct PaymentStarted {
    pub checkout_url: String,
    pub session_id: String,
}

/// POST /checkout/pay - create a processor session for the pending order.
#[instrument(skip(state, session))]
async fn start_payment(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<PaymentStarted>> {
    let order_id: OrderId = session
        .get(session_keys::PENDING_ORDER)
        .await
        .ok()
        .flatten()
        .ok_or_else(|| AppError::BadRequest("no order awaiting payment".to_owned()))?;

    let order = OrderRepository::new(state.pool())
        .get_with_lines(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    if order.order.paid {
        return Err(AppError::BadRequest("order is already paid".to_owned()));
    }

    let base = &state.config().base_url;
    let checkout = state
        .payments()
        .create_checkout_session(
            &order,
            &format!("{base}/checkout/completed"),
            &format!("{base}/checkout/cancelled"),
        )
        .await?;

    Ok(Json(PaymentStarted {
        checkout_url: checkout.url,
        session_id: checkout.id,
    }))
}

/// GET /checkout/completed - landing after a successful payment.
///
/// Settlement itself arrives over the webhook; this only acknowledges the
/// redirect.
#[instrument]
async fn completed() -> Json<serde_json::Value> {
    Json(json!({ "status": "completed" }))
}

/// GET /checkout/cancelled - landing after an abandoned payment.
#[instrument]
async fn cancelled() -> Json<serde_json::Value> {
    Json(json!({ "status": "cancelled" }))
}

/// POST /webhooks/payments - signed settlement events from the processor.
#[instrument(skip(state, headers, body))]
async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    // Verify on the raw bytes before anything else touches the payload.
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|value| value.to_str().ok());
    webhook::verify_signature(
        &body,
        signature,
        state.config().payments.webhook_secret.expose_secret(),
        Utc::now(),
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "rejected webhook before state lookup");
        AppError::BadRequest(e.to_string())
    })?;

    let event = webhook::parse_event(&body)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    match settlement_of(&event) {
        Some(settlement) => settle(&state, settlement).await,
        None => {
            tracing::debug!(kind = %event.kind, "ignoring non-settlement event");
            Ok(StatusCode::OK)
        }
    }
}

/// A settlement extracted from an event.
struct Settlement {
    order_id: OrderId,
    payment_reference: String,
    payer_email: Option<String>,
}

/// Map an event onto a settlement, if it is one.
///
/// `checkout.session.completed` is authoritative. `payment_intent.succeeded`
/// is a fallback for integrations where the session event does not fire;
/// both funnel into the same idempotent transition, so whichever arrives
/// second is a no-op.
fn settlement_of(event: &WebhookEvent) -> Option<Settlement> {
    let object = &event.data.object;

    match event.kind.as_str() {
        CHECKOUT_COMPLETED => {
            if object.mode.as_deref() != Some("payment")
                || object.payment_status.as_deref() != Some("paid")
            {
                return None;
            }
            let order_id = object.client_reference_id.as_deref()?.parse().ok()?;
            Some(Settlement {
                order_id: OrderId::new(order_id),
                payment_reference: object
                    .payment_intent
                    .clone()
                    .unwrap_or_else(|| object.id.clone()),
                payer_email: object.customer_email.clone(),
            })
        }
        PAYMENT_INTENT_SUCCEEDED => {
            let order_id = object.metadata.get("order_id")?.parse().ok()?;
            Some(Settlement {
                order_id: OrderId::new(order_id),
                payment_reference: object.id.clone(),
                payer_email: object.customer_email.clone(),
            })
        }
        _ => None,
    }
}

/// Apply a settlement: one conditional transition, then the one-shot
/// side effects.
async fn settle(state: &AppState, settlement: Settlement) -> Result<StatusCode> {
    let orders = OrderRepository::new(state.pool());

    match orders
        .mark_paid(settlement.order_id, &settlement.payment_reference)
        .await?
    {
        MarkPaidOutcome::Transitioned => {
            let order = orders
                .get_with_lines(settlement.order_id)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "order {} vanished after paid transition",
                        settlement.order_id
                    ))
                })?;

            backfill_account(state, &order, settlement.payer_email.as_deref()).await;
            record_recommendations(state, &order).await;
            state.jobs().enqueue(Job::SendInvoice(order.order.id));

            tracing::info!(order_id = %order.order.id, "order settled");
            Ok(StatusCode::OK)
        }
        MarkPaidOutcome::AlreadyPaid => {
            tracing::info!(order_id = %settlement.order_id, "duplicate settlement event ignored");
            Ok(StatusCode::OK)
        }
        MarkPaidOutcome::NotFound => Err(AppError::NotFound(format!(
            "order {}",
            settlement.order_id
        ))),
    }
}

/// Back-fill ownership of a guest order when the payer email matches an
/// account. Best-effort: failures are logged, settlement stands.
async fn backfill_account(state: &AppState, order: &OrderWithLines, payer_email: Option<&str>) {
    if order.order.account_id.is_some() {
        return;
    }

    let raw_email = payer_email.unwrap_or(&order.order.email);
    let Ok(email) = Email::parse(raw_email) else {
        return;
    };

    let accounts = AccountRepository::new(state.pool());
    match accounts.get_by_email(&email).await {
        Ok(Some(account)) => {
            if let Err(e) = OrderRepository::new(state.pool())
                .attach_account(order.order.id, account.id)
                .await
            {
                tracing::error!(order_id = %order.order.id, error = %e, "account back-fill failed");
            }
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(order_id = %order.order.id, error = %e, "account lookup failed");
        }
    }
}

/// Record the co-purchase signal for the settled order's products.
/// Best-effort: a lost update here only weakens a suggestion.
async fn record_recommendations(state: &AppState, order: &OrderWithLines) {
    let ids = order.product_ids();
    if ids.len() < 2 {
        return;
    }

    if let Err(e) = RecommendationRepository::new(state.pool())
        .record_co_purchase(&ids)
        .await
    {
        tracing::error!(order_id = %order.order.id, error = %e, "co-purchase recording failed");
    }
}
