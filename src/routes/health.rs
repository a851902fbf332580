use crate::dto::exam_dto::QuotaResponse;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    let body = json!({
        "status": "ok",
    });
    (StatusCode::OK, Json(body))
}

/// Current window counters alongside the configured caps.
pub async fn quota(State(state): State<AppState>) -> Json<QuotaResponse> {
    Json(QuotaResponse {
        usage: state.quota.snapshot(),
        limits: *state.quota.limits(),
    })
}
