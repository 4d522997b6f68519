use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

use super::auth::{require_admin, require_auth, require_self_or_admin};
use super::{error_status, AppState};
use crate::models::transactions::{NewDeposit, NewWithdrawal};
use crate::services::transactions::TransactionServiceRequest;

#[derive(Deserialize)]
pub struct DepositTransition {
    pub status: String,
    pub admin_notes: Option<String>,
}

#[derive(Deserialize)]
pub struct WithdrawalTransition {
    pub status: String,
    pub mtr_number: Option<String>,
    pub admin_notes: Option<String>,
}

pub async fn request_deposit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewDeposit>,
) -> impl IntoResponse {
    let context = match require_auth(&state, &headers).await {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    if let Err(failure) = require_self_or_admin(&context, &req.user_id) {
        return failure;
    }

    let (transaction_tx, transaction_rx) = oneshot::channel();
    let sent = state
        .transaction_channel
        .send(TransactionServiceRequest::CreateDeposit {
            request: req,
            response: transaction_tx,
        })
        .await;

    if let Err(e) = sent {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"description": format!("Failed to process request: {}", e)})),
        );
    }

    match transaction_rx.await {
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

pub async fn request_withdrawal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewWithdrawal>,
) -> impl IntoResponse {
    let context = match require_auth(&state, &headers).await {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    if let Err(failure) = require_self_or_admin(&context, &req.user_id) {
        return failure;
    }

    let (transaction_tx, transaction_rx) = oneshot::channel();
    let sent = state
        .transaction_channel
        .send(TransactionServiceRequest::CreateWithdrawal {
            request: req,
            response: transaction_tx,
        })
        .await;

    if let Err(e) = sent {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"description": format!("Failed to process request: {}", e)})),
        );
    }

    match transaction_rx.await {
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

pub async fn get_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(transaction_id): Path<i64>,
) -> impl IntoResponse {
    let context = match require_auth(&state, &headers).await {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    let (transaction_tx, transaction_rx) = oneshot::channel();
    let sent = state
        .transaction_channel
        .send(TransactionServiceRequest::GetTransaction {
            transaction_id,
            response: transaction_tx,
        })
        .await;

    if let Err(e) = sent {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"description": format!("Failed to process request: {}", e)})),
        );
    }

    match transaction_rx.await {
        Ok(Ok(Some(transaction))) => {
            if let Err(failure) = require_self_or_admin(&context, &transaction.user_id) {
                return failure;
            }
            (StatusCode::OK, Json(json!(transaction)))
        }
        Ok(Ok(None)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"description": "Transaction not found."})),
        ),
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

pub async fn transition_deposit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(transaction_id): Path<i64>,
    Json(req): Json<DepositTransition>,
) -> impl IntoResponse {
    if let Err(failure) = require_admin(&state, &headers).await {
        return failure;
    }

    let (transaction_tx, transaction_rx) = oneshot::channel();
    let sent = state
        .transaction_channel
        .send(TransactionServiceRequest::TransitionDeposit {
            transaction_id,
            new_status: req.status,
            admin_notes: req.admin_notes,
            response: transaction_tx,
        })
        .await;

    if let Err(e) = sent {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"description": format!("Failed to process request: {}", e)})),
        );
    }

    match transaction_rx.await {
        Ok(Ok(transaction)) => (StatusCode::OK, Json(json!(transaction))),
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

pub async fn transition_withdrawal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(transaction_id): Path<i64>,
    Json(req): Json<WithdrawalTransition>,
) -> impl IntoResponse {
    if let Err(failure) = require_admin(&state, &headers).await {
        return failure;
    }

    let (transaction_tx, transaction_rx) = oneshot::channel();
    let sent = state
        .transaction_channel
        .send(TransactionServiceRequest::TransitionWithdrawal {
            transaction_id,
            new_status: req.status,
            mtr_number: req.mtr_number,
            admin_notes: req.admin_notes,
            response: transaction_tx,
        })
        .await;

    if let Err(e) = sent {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"description": format!("Failed to process request: {}", e)})),
        );
    }

    match transaction_rx.await {
        Ok(Ok(transaction)) => (StatusCode::OK, Json(json!(transaction))),
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
