//! Payment webhook handlers.
//!
//! Both endpoints are unauthenticated but signature-verified, and both
//! are replay-safe: settlement goes through the store's `settle_payment`,
//! so re-delivered events find the payment already `Paid` and change
//! nothing. Events for unknown payment IDs are acknowledged with a log
//! line; erroring would only make the processor retry a payment we will
//! never recognize.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use guia_store::Store;

use crate::crypto;
use crate::error::ApiError;
use crate::handlers::payments;
use crate::pix::WebhookPayload;
use crate::state::AppState;

/// Stripe event envelope (the fields this service reads).
#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

/// `POST /webhooks/stripe` - Stripe event delivery.
///
/// Only `checkout.session.completed` with `payment_status == "paid"`
/// settles; everything else is acknowledged and logged.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(secret) = &state.config.stripe_webhook_secret {
        let signature = headers
            .get("stripe-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::BadRequest("missing stripe-signature header".into()))?;
        verify_stripe_signature(&body, signature, secret)?;
    } else {
        tracing::warn!("Stripe webhook secret not configured - skipping signature verification");
    }

    let event: StripeEvent = serde_json::from_str(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid webhook payload: {e}")))?;

    tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Stripe webhook received");

    if event.event_type == "checkout.session.completed" {
        let session_id = event
            .data
            .object
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ApiError::BadRequest("event object has no session id".into()))?;

        let payment_status = event
            .data
            .object
            .get("payment_status")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        if payment_status == "paid" {
            settle_by_payment_id(&state, session_id)?;
        } else {
            // Async payment methods complete the session before the money
            // moves; a later event carries the paid status.
            tracing::info!(
                session_id = %session_id,
                payment_status = %payment_status,
                "Checkout session completed but not paid yet"
            );
        }
    }

    Ok(Json(json!({ "received": true })))
}

/// `POST /webhooks/pix` - PIX payment notification.
///
/// The body is a batch of received payments; each one settles its charge.
pub async fn pix_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(secret) = &state.config.pix_webhook_secret {
        let signature = headers
            .get("x-webhook-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::BadRequest("missing x-webhook-signature header".into()))?;

        let expected = crypto::hmac_sha256_hex(secret, &body);
        if !crypto::constant_time_eq(&expected, signature) {
            return Err(ApiError::BadRequest("webhook signature mismatch".into()));
        }
    } else {
        tracing::warn!("PIX webhook secret not configured - skipping signature verification");
    }

    let payload: WebhookPayload = serde_json::from_str(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid webhook payload: {e}")))?;

    tracing::debug!(count = payload.pix.len(), "PIX webhook received");

    for received in &payload.pix {
        settle_by_payment_id(&state, &received.txid)?;
    }

    Ok(Json(json!({ "received": true })))
}

/// Settle the pending payment behind a processor transaction ID.
///
/// Unknown IDs are logged and acknowledged.
fn settle_by_payment_id(state: &AppState, payment_id: &str) -> Result<(), ApiError> {
    match state.store.get_payment(payment_id)? {
        Some(payment) => {
            payments::settle(state, &payment)?;
            Ok(())
        }
        None => {
            tracing::warn!(payment_id = %payment_id, "Webhook for unknown payment; acknowledging");
            Ok(())
        }
    }
}

/// Check a `stripe-signature` header (`t=<ts>,v1=<hex>[,v1=...]`) against
/// the signing secret.
fn verify_stripe_signature(payload: &str, header: &str, secret: &str) -> Result<(), ApiError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| ApiError::BadRequest("invalid stripe-signature header".into()))?;
    if signatures.is_empty() {
        return Err(ApiError::BadRequest("invalid stripe-signature header".into()));
    }

    let signed_payload = format!("{timestamp}.{payload}");
    let expected = crypto::hmac_sha256_hex(secret, &signed_payload);

    if signatures
        .iter()
        .any(|sig| crypto::constant_time_eq(&expected, sig))
    {
        Ok(())
    } else {
        Err(ApiError::BadRequest("webhook signature mismatch".into()))
    }
}
