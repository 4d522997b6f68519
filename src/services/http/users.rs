use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use super::auth::{require_auth, require_self_or_admin};
use super::{error_status, AppState};
use crate::services::transactions::TransactionServiceRequest;

pub async fn get_balances(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let context = match require_auth(&state, &headers).await {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    if let Err(failure) = require_self_or_admin(&context, &user_id) {
        return failure;
    }

    let (user_tx, user_rx) = oneshot::channel();
    let sent = state
        .transaction_channel
        .send(TransactionServiceRequest::GetUserBalances {
            user_id,
            response: user_tx,
        })
        .await;

    if let Err(e) = sent {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"description": format!("Failed to process request: {}", e)})),
        );
    }

    match user_rx.await {
        Ok(Ok(balances)) => (StatusCode::OK, Json(json!(balances))),
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

pub async fn list_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let context = match require_auth(&state, &headers).await {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    if let Err(failure) = require_self_or_admin(&context, &user_id) {
        return failure;
    }

    let (list_tx, list_rx) = oneshot::channel();
    let sent = state
        .transaction_channel
        .send(TransactionServiceRequest::ListUserTransactions {
            user_id,
            response: list_tx,
        })
        .await;

    if let Err(e) = sent {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"description": format!("Failed to process request: {}", e)})),
        );
    }

    match list_rx.await {
        Ok(Ok(transactions)) => (StatusCode::OK, Json(json!(transactions))),
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
