use crate::domain::registration::ConfirmingActor;
use crate::gateways::GatewayError;
use crate::service::reconciler::ReconcileOutcome;
use crate::AppState;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub session_id: String,
}

/// Client poll channel, hit from the post-payment redirect page. Folds the
/// reconciliation outcome into the handful of states a buyer-facing page
/// can render; internal detail stays in the logs.
pub async fn verify_checkout(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> impl IntoResponse {
    match state
        .reconciler
        .reconcile(&params.session_id, ConfirmingActor::ClientPoll)
        .await
    {
        Ok(outcome) => {
            let (ui, registration_id) = ui_state(&outcome);
            (
                axum::http::StatusCode::OK,
                Json(serde_json::json!({
                    "state": ui,
                    "registration_id": registration_id
                })),
            )
                .into_response()
        }
        Err(err) => match err.downcast_ref::<GatewayError>() {
            Some(GatewayError::SessionNotFound(_)) => (
                axum::http::StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "unknown checkout session"})),
            )
                .into_response(),
            Some(GatewayError::Unavailable(_)) => (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"state": "processing", "retry": true})),
            )
                .into_response(),
            _ => {
                tracing::error!(session_id = %params.session_id, error = %err, "verify failed");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": "verification failed"})),
                )
                    .into_response()
            }
        },
    }
}

pub fn ui_state(outcome: &ReconcileOutcome) -> (&'static str, Option<Uuid>) {
    match outcome {
        ReconcileOutcome::NewlyConfirmed { registration_id }
        | ReconcileOutcome::AlreadyConfirmed { registration_id } => {
            ("confirmed", Some(*registration_id))
        }
        ReconcileOutcome::NotYetPaid => ("processing", None),
        ReconcileOutcome::PaymentFailed => ("failed", None),
        ReconcileOutcome::IntentMissing => ("needs_support", None),
    }
}
