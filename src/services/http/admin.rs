use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use super::auth::require_admin;
use super::{error_status, AppState};
use crate::services::admin::{AdminRequest, ManualAdjustment};

pub async fn create_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ManualAdjustment>,
) -> impl IntoResponse {
    if let Err(failure) = require_admin(&state, &headers).await {
        return failure;
    }

    let (admin_tx, admin_rx) = oneshot::channel();
    let sent = state
        .admin_channel
        .send(AdminRequest::CreateTransaction {
            adjustment: req,
            response: admin_tx,
        })
        .await;

    if let Err(e) = sent {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"description": format!("Failed to process request: {}", e)})),
        );
    }

    match admin_rx.await {
        Ok(Ok(transaction)) => (StatusCode::CREATED, Json(json!(transaction))),
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
