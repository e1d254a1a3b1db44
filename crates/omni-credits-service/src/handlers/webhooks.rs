//! Payment webhook handler.
//!
//! The signature is verified before any payload field is trusted. Once the
//! signature check passes, every event is acknowledged with a 200 even when
//! the business effect is a no-op, so the provider does not keep retrying.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use omni_credits_core::{CreditTransaction, PaymentSession, UserId};
use omni_credits_store::{Store, StoreError};

use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::CheckoutSession;

/// The envelope every payment event arrives in.
#[derive(Debug, Deserialize)]
pub struct PaymentEvent {
    /// Event type, e.g. `checkout.session.completed`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Provider event id.
    pub id: String,
    /// Event payload.
    pub data: PaymentEventData,
}

/// Payload container; `object` is typed per event kind at the point of use.
#[derive(Debug, Deserialize)]
pub struct PaymentEventData {
    /// The event's subject object.
    pub object: serde_json::Value,
}

/// Acknowledgment body.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was accepted.
    pub received: bool,
}

/// Handle payment provider webhooks.
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    if state.config.stripe_webhook_secret.is_some() {
        let signature = headers
            .get("stripe-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::InvalidSignature)?;

        let stripe = state
            .stripe
            .as_ref()
            .ok_or_else(|| ApiError::ExternalService("Stripe not configured".into()))?;

        stripe
            .verify_webhook_signature(&body, signature)
            .map_err(|e| {
                tracing::warn!(error = %e, "Invalid payment webhook signature");
                ApiError::InvalidSignature
            })?;
    } else {
        // No webhook secret configured - skip verification (development mode)
        tracing::warn!("Webhook secret not configured - skipping signature verification");
    }

    let event: PaymentEvent =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %event.event_type,
        event_id = %event.id,
        "Received payment webhook"
    );

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            credit_completed_checkout(&state, event.data.object)?;
        }
        "payment_intent.succeeded" => {
            let id = object_id(&event.data.object);
            tracing::info!(payment_intent_id = %id, "Payment succeeded");
        }
        "invoice.payment_failed" => {
            let id = object_id(&event.data.object);
            tracing::warn!(invoice_id = %id, "Payment failed");
        }
        other => {
            tracing::debug!(event_type = %other, "Unhandled payment event");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

fn object_id(object: &serde_json::Value) -> &str {
    object.get("id").and_then(|v| v.as_str()).unwrap_or("unknown")
}

/// Credit the ledger for a completed checkout session.
///
/// Missing or malformed attribution is a server-side integrity problem: it
/// is logged and the event is acknowledged without action, never surfaced as
/// a request error. Replayed session ids are acknowledged as no-ops.
fn credit_completed_checkout(
    state: &AppState,
    object: serde_json::Value,
) -> Result<(), ApiError> {
    let session: CheckoutSession = match serde_json::from_value(object) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "Checkout event carries no parsable session");
            return Ok(());
        }
    };

    if session.payment_status.as_deref() != Some("paid") {
        tracing::info!(
            session_id = %session.id,
            payment_status = session.payment_status.as_deref().unwrap_or("unknown"),
            "Checkout session not paid yet, skipping"
        );
        return Ok(());
    }

    let Some(user_id_str) = session.user_id() else {
        tracing::warn!(session_id = %session.id, "Checkout session has no user attribution");
        return Ok(());
    };

    let credits = session.credits();
    if credits <= 0 {
        tracing::warn!(
            session_id = %session.id,
            user_id = %user_id_str,
            credits = %credits,
            "Checkout session has no positive credits amount"
        );
        return Ok(());
    }

    let Ok(user_id) = user_id_str.parse::<UserId>() else {
        tracing::warn!(
            session_id = %session.id,
            user_id = %user_id_str,
            "Checkout session carries an invalid user id"
        );
        return Ok(());
    };

    let Some(account) = state.store.get_account(&user_id)? else {
        tracing::warn!(
            session_id = %session.id,
            user_id = %user_id,
            "Checkout session references a missing account"
        );
        return Ok(());
    };

    let mut record = PaymentSession::new(session.id.clone(), user_id, credits);
    if let Some(package_id) = &session.metadata.package_id {
        record = record.with_package(package_id.clone());
    }
    if let Some(payment_intent) = &session.payment_intent {
        record = record.with_payment_intent(payment_intent.clone());
    }

    let tx = CreditTransaction::purchase(
        user_id,
        credits,
        account.balance_credits + credits,
        format!("Purchased {credits} credits"),
        serde_json::json!({
            "session_id": session.id,
            "payment_intent": session.payment_intent,
            "package_id": session.metadata.package_id,
        }),
    );

    match state.store.credit_purchase(&user_id, credits, &record, &tx) {
        Ok(balance) => {
            tracing::info!(
                user_id = %user_id,
                session_id = %session.id,
                credits_added = %credits,
                new_balance = %balance,
                transaction_id = %tx.id,
                "Credits added from checkout"
            );
            Ok(())
        }
        Err(StoreError::DuplicateSession { session_id }) => {
            // Providers redeliver events; a replay is acknowledged unchanged
            tracing::info!(
                session_id = %session_id,
                "Checkout session already processed, ignoring replay"
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
