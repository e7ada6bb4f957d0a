use crate::domain::registration::ConfirmingActor;
use crate::gateways::GatewayError;
use crate::service::reconciler::{reconcilable_session, ReconcileOutcome};
use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;

/// Checkout gateway push channel. Replies 200 for every logically-handled
/// event (duplicates included) so the gateway stops retrying; only
/// infrastructure failures earn a 5xx and another delivery attempt.
pub async fn checkout_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok());

    let event = match state.gateway.parse_webhook(&body, signature) {
        Ok(event) => event,
        Err(err @ (GatewayError::MalformedPayload(_) | GatewayError::InvalidSignature(_))) => {
            tracing::warn!(error = %err, "rejected webhook payload");
            return (
                axum::http::StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": err.to_string()})),
            )
                .into_response();
        }
        Err(err) => {
            tracing::error!(error = %err, "webhook parsing failed");
            return (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "webhook handling failed"})),
            )
                .into_response();
        }
    };

    let Some(session_id) = reconcilable_session(&event) else {
        return (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({"received": true, "handled": false})),
        )
            .into_response();
    };

    match state
        .reconciler
        .reconcile(session_id, ConfirmingActor::GatewayWebhook)
        .await
    {
        Ok(outcome) => (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({
                "received": true,
                "outcome": outcome_label(&outcome)
            })),
        )
            .into_response(),
        Err(err) => {
            if let Some(GatewayError::SessionNotFound(_)) = err.downcast_ref::<GatewayError>() {
                // the gateway sent us a session it no longer knows; a retry
                // cannot improve on that
                tracing::warn!(session_id, "webhook referenced an unknown session");
                return (
                    axum::http::StatusCode::OK,
                    Json(serde_json::json!({"received": true, "outcome": "unknown_session"})),
                )
                    .into_response();
            }
            tracing::error!(session_id, error = %err, "webhook reconciliation failed");
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "reconciliation failed"})),
            )
                .into_response()
        }
    }
}

fn outcome_label(outcome: &ReconcileOutcome) -> &'static str {
    match outcome {
        ReconcileOutcome::AlreadyConfirmed { .. } => "already_confirmed",
        ReconcileOutcome::NewlyConfirmed { .. } => "newly_confirmed",
        ReconcileOutcome::NotYetPaid => "not_yet_paid",
        ReconcileOutcome::PaymentFailed => "payment_failed",
        ReconcileOutcome::IntentMissing => "intent_missing",
    }
}
