use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use super::admin::AdminRequest;
use super::bonus::BonusRequest;
use super::campaigns::CampaignRequest;
use super::transactions::TransactionServiceRequest;
use super::ServiceError;
use crate::repositories::auth::AuthApi;
use crate::settings::Settings;

mod admin;
mod auth;
mod bonus;
mod campaigns;
mod transactions;
mod users;

#[derive(Clone)]
pub struct AppState {
    transaction_channel: mpsc::Sender<TransactionServiceRequest>,
    bonus_channel: mpsc::Sender<BonusRequest>,
    admin_channel: mpsc::Sender<AdminRequest>,
    campaign_channel: mpsc::Sender<CampaignRequest>,
    auth: AuthApi,
}

fn error_status(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::AlreadyProcessed(_) => StatusCode::CONFLICT,
        ServiceError::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::ExternalGateway(_) => StatusCode::BAD_GATEWAY,
        ServiceError::Database(_) | ServiceError::Communication(_, _) | ServiceError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub async fn start_http_server(
    settings: &Settings,
    transaction_channel: mpsc::Sender<TransactionServiceRequest>,
    bonus_channel: mpsc::Sender<BonusRequest>,
    admin_channel: mpsc::Sender<AdminRequest>,
    campaign_channel: mpsc::Sender<CampaignRequest>,
) -> Result<(), anyhow::Error> {
    let app_state = AppState {
        transaction_channel,
        bonus_channel,
        admin_channel,
        campaign_channel,
        auth: AuthApi::new(settings.auth.url.clone()),
    };

    let app = Router::new()
        .route("/api/transactions/deposits", post(transactions::request_deposit))
        .route(
            "/api/transactions/withdrawals",
            post(transactions::request_withdrawal),
        )
        .route("/api/transactions/{id}", get(transactions::get_transaction))
        .route(
            "/api/transactions/{id}/deposit-status",
            put(transactions::transition_deposit),
        )
        .route(
            "/api/transactions/{id}/withdrawal-status",
            put(transactions::transition_withdrawal),
        )
        .route("/api/users/{id}/balance", get(users::get_balances))
        .route("/api/users/{id}/transactions", get(users::list_transactions))
        .route("/api/admin/transactions", post(admin::create_transaction))
        .route(
            "/api/campaigns",
            post(campaigns::create_campaign).get(campaigns::list_campaigns),
        )
        .route("/api/campaigns/active", get(campaigns::list_active_campaigns))
        .route("/api/bonus/run", post(bonus::run_batch))
        .route("/health", get(|| async { "OK" }))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    let address = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
