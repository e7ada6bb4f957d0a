use crate::service::manual_confirm::{ManualConfirmError, ManualConfirmOutcome};
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ManualConfirmRequest {
    pub operator: String,
    pub reference: Option<String>,
    pub note: Option<String>,
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
    Json(req): Json<ManualConfirmRequest>,
) -> impl IntoResponse {
    match state
        .manual_confirmation
        .confirm(
            payment_id,
            &req.operator,
            req.reference.as_deref(),
            req.note.as_deref(),
        )
        .await
    {
        Ok(ManualConfirmOutcome::Confirmed(record)) => (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({"payment_record": record, "already_confirmed": false})),
        )
            .into_response(),
        Ok(ManualConfirmOutcome::AlreadyConfirmed(record)) => (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({"payment_record": record, "already_confirmed": true})),
        )
            .into_response(),
        Err(ManualConfirmError::NotFound) => (
            axum::http::StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "payment record not found"})),
        )
            .into_response(),
        Err(ManualConfirmError::InvalidState(reason)) => (
            axum::http::StatusCode::CONFLICT,
            Json(serde_json::json!({"error": reason})),
        )
            .into_response(),
        Err(ManualConfirmError::Storage(err)) => {
            tracing::error!(payment_id = %payment_id, error = %err, "manual confirmation failed");
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "confirmation failed"})),
            )
                .into_response()
        }
    }
}
