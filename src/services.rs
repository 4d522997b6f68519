use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::repositories::transactions::LedgerError;
use crate::settings::Settings;
use crate::utils::otp::TotpVerifier;

mod admin;
mod bonus;
mod campaigns;
mod http;
mod notifier;
mod platform;
mod transactions;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already processed: {0}")]
    AlreadyProcessed(String),
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("External gateway failure: {0}")]
    ExternalGateway(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Communication error: {0} - {1}")]
    Communication(String, String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LedgerError> for ServiceError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::Database(e) => ServiceError::Database(e.to_string()),
            LedgerError::TransactionNotFound(id) => {
                ServiceError::NotFound(format!("transaction {}", id))
            }
            LedgerError::UserNotFound(id) => ServiceError::NotFound(format!("user {}", id)),
            LedgerError::AlreadyProcessed => {
                ServiceError::AlreadyProcessed("transaction already processed".to_string())
            }
            LedgerError::InsufficientFunds => ServiceError::InsufficientFunds,
            LedgerError::InvalidAmount => {
                ServiceError::Validation("amount must be positive".to_string())
            }
            LedgerError::ReferenceAllocation => {
                ServiceError::Internal("could not allocate a unique reference number".to_string())
            }
        }
    }
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(pool: PgPool, settings: Settings) -> Result<(), anyhow::Error> {
    let (transaction_tx, mut transaction_rx) = mpsc::channel(512);
    let (platform_tx, mut platform_rx) = mpsc::channel(512);
    let (notifier_tx, mut notifier_rx) = mpsc::channel(512);
    let (bonus_tx, mut bonus_rx) = mpsc::channel(512);
    let (admin_tx, mut admin_rx) = mpsc::channel(512);
    let (campaign_tx, mut campaign_rx) = mpsc::channel(512);

    let mut transaction_service = transactions::TransactionService::new();
    let mut platform_service = platform::PlatformService::new();
    let mut notifier_service = notifier::NotifierService::new();
    let mut bonus_service = bonus::BonusService::new();
    let mut admin_service = admin::AdminService::new();
    let mut campaign_service = campaigns::CampaignService::new();

    log::info!("Starting platform gateway service.");
    let platform_settings = settings.platform.clone();
    tokio::spawn(async move {
        let handler = platform::PlatformRequestHandler::new(&platform_settings);
        platform_service.run(handler, &mut platform_rx).await;
    });

    log::info!("Starting notifier service.");
    let notifier_settings = settings.notifier.clone();
    tokio::spawn(async move {
        let handler = notifier::NotifierRequestHandler::new(&notifier_settings);
        notifier_service.run(handler, &mut notifier_rx).await;
    });

    log::info!("Starting transaction service.");
    let transaction_pool = pool.clone();
    let transaction_platform_tx = platform_tx.clone();
    let transaction_notifier_tx = notifier_tx.clone();
    let main_account_id = settings.platform.main_account_id.clone();
    tokio::spawn(async move {
        transaction_service
            .run(
                transactions::TransactionRequestHandler::new(
                    transaction_pool,
                    transaction_platform_tx,
                    transaction_notifier_tx,
                    main_account_id,
                ),
                &mut transaction_rx,
            )
            .await;
    });

    log::info!("Starting campaign bonus service.");
    let bonus_pool = pool.clone();
    let bonus_platform_tx = platform_tx.clone();
    let scan_interval = settings.bonus.scan_interval_secs;
    tokio::spawn(async move {
        let handler = bonus::BonusRequestHandler::new(bonus_pool, bonus_platform_tx);
        handler.start_scan_task(scan_interval);
        bonus_service.run(handler, &mut bonus_rx).await;
    });

    log::info!("Starting admin transaction service.");
    let admin_pool = pool.clone();
    let admin_platform_tx = platform_tx.clone();
    let admin_notifier_tx = notifier_tx.clone();
    let admin_main_account_id = settings.platform.main_account_id.clone();
    let otp_verifier = TotpVerifier::new(&settings.otp.secret);
    tokio::spawn(async move {
        admin_service
            .run(
                admin::AdminRequestHandler::new(
                    admin_pool,
                    admin_platform_tx,
                    admin_notifier_tx,
                    otp_verifier,
                    admin_main_account_id,
                ),
                &mut admin_rx,
            )
            .await;
    });

    log::info!("Starting campaign service.");
    let campaign_pool = pool.clone();
    tokio::spawn(async move {
        campaign_service
            .run(
                campaigns::CampaignRequestHandler::new(campaign_pool),
                &mut campaign_rx,
            )
            .await;
    });

    log::info!("Starting HTTP server.");
    http::start_http_server(
        &settings,
        transaction_tx,
        bonus_tx,
        admin_tx,
        campaign_tx,
    )
    .await
}
