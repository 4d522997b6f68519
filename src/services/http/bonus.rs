use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use super::auth::require_staff;
use super::{error_status, AppState};
use crate::services::bonus::BonusRequest;

/// On-demand batch trigger; the external cron hits this endpoint.
pub async fn run_batch(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(failure) = require_staff(&state, &headers).await {
        return failure;
    }

    let (bonus_tx, bonus_rx) = oneshot::channel();
    let sent = state
        .bonus_channel
        .send(BonusRequest::RunBatch { response: bonus_tx })
        .await;

    if let Err(e) = sent {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"description": format!("Failed to process request: {}", e)})),
        );
    }

    match bonus_rx.await {
        Ok(Ok(summary)) => (StatusCode::OK, Json(json!(summary))),
        Ok(Err(service_error)) => (
            error_status(&service_error),
            Json(json!({"description": service_error.to_string()})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"description": format!("Failed to receive response: {}", e)})),
        ),
    }
}
