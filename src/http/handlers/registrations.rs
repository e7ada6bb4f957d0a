use crate::domain::registration::SubmitRegistrationRequest;
use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

pub async fn submit_registration(
    State(state): State<AppState>,
    Json(req): Json<SubmitRegistrationRequest>,
) -> impl IntoResponse {
    match state.checkout_service.submit(req).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn health() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "ok")
}
