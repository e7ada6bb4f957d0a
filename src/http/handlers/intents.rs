use crate::domain::intent::{IntentLineItem, RegistrantDetails, RegistrationIntent};
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PutIntentRequest {
    pub registrant: RegistrantDetails,
    #[serde(default)]
    pub form_data: serde_json::Value,
    pub line_items: Vec<IntentLineItem>,
}

/// Internal store-and-forward surface used between submission and the
/// gateway redirect when those run in different processes.
pub async fn put_intent(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Json(req): Json<PutIntentRequest>,
) -> impl IntoResponse {
    let now = Utc::now();
    let intent = RegistrationIntent {
        reference: reference.clone(),
        registrant: req.registrant,
        form_data: req.form_data,
        amount_minor: req.line_items.iter().map(|i| i.unit_price_minor).sum(),
        line_items: req.line_items,
        currency: state.currency.clone(),
        created_at: now,
        expires_at: now + Duration::seconds(state.intent_ttl_secs as i64),
    };

    match state.intents.put(&intent).await {
        Ok(()) => (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({
                "reference": reference,
                "expires_at": intent.expires_at
            })),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(%reference, error = %err, "intent store write failed");
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "intent store unavailable"})),
            )
                .into_response()
        }
    }
}

pub async fn get_intent(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> impl IntoResponse {
    match state.intents.get(&reference).await {
        Ok(Some(intent)) => (axum::http::StatusCode::OK, Json(intent)).into_response(),
        Ok(None) => (
            axum::http::StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "intent not found"})),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(%reference, error = %err, "intent store read failed");
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "intent store unavailable"})),
            )
                .into_response()
        }
    }
}
