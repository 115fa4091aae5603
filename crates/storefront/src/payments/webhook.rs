//! Settlement webhook verification and parsing.
//!
//! Events arrive signed with an HMAC-SHA256 header of the form
//! `t=<unix-ts>,v1=<hex>` over `"{t}.{raw body}"`. Verification happens on
//! the raw bytes, before any JSON parsing or database lookup - an event
//! that fails here never reaches the settlement state machine. Timestamps
//! older than the tolerance are rejected to stop replays.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age of a signed event.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Event type we treat as authoritative for settlement.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
/// Fallback event; funnels into the same idempotent transition.
pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";

/// Reasons an event is rejected before reaching any state.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WebhookError {
    /// The signature header is missing.
    #[error("missing signature header")]
    MissingSignature,

    /// The signature header does not have the `t=..,v1=..` shape.
    #[error("malformed signature header")]
    MalformedSignature,

    /// The computed HMAC does not match the provided one.
    #[error("signature mismatch")]
    InvalidSignature,

    /// The signed timestamp is outside the tolerance window.
    #[error("signature timestamp outside tolerance")]
    StaleTimestamp,

    /// The payload is not valid JSON of the expected shape.
    #[error("unparseable payload: {0}")]
    Payload(String),
}

/// Verify the signature header against the raw payload.
///
/// `now` is passed in rather than read from the clock so the check is
/// deterministic under test.
///
/// # Errors
///
/// Returns a [`WebhookError`] describing the first check that failed.
pub fn verify_signature(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<(), WebhookError> {
    let header = header.ok_or(WebhookError::MissingSignature)?;

    let mut timestamp: Option<i64> = None;
    let mut provided: Option<String> = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(
                    value
                        .parse()
                        .map_err(|_| WebhookError::MalformedSignature)?,
                );
            }
            Some(("v1", value)) => provided = Some(value.to_owned()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::MalformedSignature)?;
    let provided = provided.ok_or(WebhookError::MalformedSignature)?;

    if (now.timestamp() - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(WebhookError::StaleTimestamp);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    // Byte comparison of two hex strings of fixed length.
    if expected != provided {
        return Err(WebhookError::InvalidSignature);
    }

    Ok(())
}

/// A settlement event, parsed after signature verification.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event type, e.g. `checkout.session.completed`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Event payload.
    pub data: EventData,
}

/// Payload wrapper, mirroring the processor's envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    /// The object the event describes.
    pub object: EventObject,
}

/// The object inside an event. Fields are optional because checkout
/// sessions and payment intents share this shape.
#[derive(Debug, Clone, Deserialize)]
pub struct EventObject {
    /// Processor-side object id (`cs_..` / `pi_..`).
    pub id: String,
    /// Checkout mode; settlement only cares about `payment`.
    #[serde(default)]
    pub mode: Option<String>,
    /// Payment status on checkout sessions (`paid` when settled).
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Our order id, echoed back on checkout sessions.
    #[serde(default)]
    pub client_reference_id: Option<String>,
    /// Payment intent id on checkout sessions.
    #[serde(default)]
    pub payment_intent: Option<String>,
    /// Payer email as reported by the processor.
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Free-form metadata; the fallback path reads `order_id` from here.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Parse a verified payload into an event.
///
/// # Errors
///
/// Returns `WebhookError::Payload` if the JSON does not match.
pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent, WebhookError> {
    serde_json::from_slice(payload).map_err(|e| WebhookError::Payload(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test123secret456";

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let now = Utc::now();
        let header = sign(payload, SECRET, now.timestamp());

        assert_eq!(
            verify_signature(payload, Some(&header), SECRET, now),
            Ok(())
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let now = Utc::now();
        let header = sign(payload, "wrong_secret", now.timestamp());

        assert_eq!(
            verify_signature(payload, Some(&header), SECRET, now),
            Err(WebhookError::InvalidSignature)
        );
    }

    #[test]
    fn test_modified_payload_rejected() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let tampered = br#"{"type":"checkout.session.completed","extra":1}"#;
        let now = Utc::now();
        let header = sign(payload, SECRET, now.timestamp());

        assert_eq!(
            verify_signature(tampered, Some(&header), SECRET, now),
            Err(WebhookError::InvalidSignature)
        );
    }

    #[test]
    fn test_old_timestamp_rejected() {
        let payload = b"{}";
        let now = Utc::now();
        let header = sign(payload, SECRET, now.timestamp() - 600);

        assert_eq!(
            verify_signature(payload, Some(&header), SECRET, now),
            Err(WebhookError::StaleTimestamp)
        );
    }

    #[test]
    fn test_missing_and_malformed_headers_rejected() {
        let payload = b"{}";
        let now = Utc::now();

        assert_eq!(
            verify_signature(payload, None, SECRET, now),
            Err(WebhookError::MissingSignature)
        );
        assert_eq!(
            verify_signature(payload, Some("garbage"), SECRET, now),
            Err(WebhookError::MalformedSignature)
        );
        assert_eq!(
            verify_signature(payload, Some("t=123"), SECRET, now),
            Err(WebhookError::MalformedSignature)
        );
        assert_eq!(
            verify_signature(payload, Some("v1=abc"), SECRET, now),
            Err(WebhookError::MalformedSignature)
        );
    }

    #[test]
    fn test_parse_checkout_completed_event() {
        let payload = br#"{
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_1",
                    "mode": "payment",
                    "payment_status": "paid",
                    "client_reference_id": "42",
                    "payment_intent": "pi_123",
                    "customer_email": "ada@example.com"
                }
            }
        }"#;

        let event = parse_event(payload).unwrap();
        assert_eq!(event.kind, CHECKOUT_COMPLETED);
        assert_eq!(event.data.object.client_reference_id.as_deref(), Some("42"));
        assert_eq!(event.data.object.payment_intent.as_deref(), Some("pi_123"));
    }

    #[test]
    fn test_parse_fallback_event_with_metadata() {
        let payload = br#"{
            "type": "payment_intent.succeeded",
            "data": {
                "object": {
                    "id": "pi_123",
                    "metadata": {"order_id": "42"}
                }
            }
        }"#;

        let event = parse_event(payload).unwrap();
        assert_eq!(event.kind, PAYMENT_INTENT_SUCCEEDED);
        assert_eq!(
            event.data.object.metadata.get("order_id").map(String::as_str),
            Some("42")
        );
    }

    #[test]
    fn test_parse_garbage_rejected() {
        assert!(matches!(
            parse_event(b"not json"),
            Err(WebhookError::Payload(_))
        ));
    }
}
