use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use super::auth::{require_admin, require_staff};
use super::{error_status, AppState};
use crate::models::campaigns::NewCampaign;
use crate::services::campaigns::CampaignRequest;

pub async fn create_campaign(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewCampaign>,
) -> impl IntoResponse {
    if let Err(failure) = require_admin(&state, &headers).await {
        return failure;
    }

    let (campaign_tx, campaign_rx) = oneshot::channel();
    let sent = state
        .campaign_channel
        .send(CampaignRequest::CreateCampaign {
            new: req,
            response: campaign_tx,
        })
        .await;

    if let Err(e) = sent {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"description": format!("Failed to process request: {}", e)})),
        );
    }

    match campaign_rx.await {
        Ok(Ok(campaign)) => (StatusCode::CREATED, Json(json!(campaign))),
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

pub async fn list_campaigns(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(failure) = require_admin(&state, &headers).await {
        return failure;
    }

    let (campaign_tx, campaign_rx) = oneshot::channel();
    let sent = state
        .campaign_channel
        .send(CampaignRequest::ListCampaigns {
            response: campaign_tx,
        })
        .await;

    if let Err(e) = sent {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"description": format!("Failed to process request: {}", e)})),
        );
    }

    match campaign_rx.await {
        Ok(Ok(campaigns)) => (StatusCode::OK, Json(json!(campaigns))),
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

pub async fn list_active_campaigns(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(failure) = require_staff(&state, &headers).await {
        return failure;
    }

    let (campaign_tx, campaign_rx) = oneshot::channel();
    let sent = state
        .campaign_channel
        .send(CampaignRequest::ListActiveCampaigns {
            response: campaign_tx,
        })
        .await;

    if let Err(e) = sent {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"description": format!("Failed to process request: {}", e)})),
        );
    }

    match campaign_rx.await {
        Ok(Ok(campaigns)) => (StatusCode::OK, Json(json!(campaigns))),
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
