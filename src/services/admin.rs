use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tokio::sync::{mpsc, oneshot};

use super::notifier::NotifierRequest;
use super::platform::PlatformServiceRequest;
use super::{RequestHandler, Service, ServiceError};
use crate::models::notifications::{EventKind, TransactionEvent};
use crate::models::platform::TransferMoney;
use crate::models::transactions::{BalanceType, Transaction, TransactionType};
use crate::repositories::transactions::TransactionRepository;
use crate::repositories::users::UserRepository;

#[derive(Clone, Debug, Deserialize)]
pub struct ManualAdjustment {
    pub user_id: String,
    pub transaction_type: String,
    pub balance_type: String,
    pub amount: Decimal,
    pub otp_code: String,
    pub notes: Option<String>,
}

pub enum AdminRequest {
    CreateTransaction {
        adjustment: ManualAdjustment,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct AdminRequestHandler {
    repository: TransactionRepository,
    users: UserRepository,
    platform_channel: mpsc::Sender<PlatformServiceRequest>,
    notifier_channel: mpsc::Sender<NotifierRequest>,
    otp: crate::utils::otp::TotpVerifier,
    main_account_id: String,
}

impl AdminRequestHandler {
    pub fn new(
        sql_conn: PgPool,
        platform_channel: mpsc::Sender<PlatformServiceRequest>,
        notifier_channel: mpsc::Sender<NotifierRequest>,
        otp: crate::utils::otp::TotpVerifier,
        main_account_id: String,
    ) -> Self {
        AdminRequestHandler {
            repository: TransactionRepository::new(sql_conn.clone()),
            users: UserRepository::new(sql_conn),
            platform_channel,
            notifier_channel,
            otp,
            main_account_id,
        }
    }

    /// Manual ledger adjustment: OTP-gated on top of admin auth, lands as a
    /// `completed` transaction with no pending phase.
    async fn create_transaction(
        &self,
        adjustment: ManualAdjustment,
    ) -> Result<Transaction, ServiceError> {
        let now_unix = Utc::now().timestamp() as u64;
        if !self.otp.verify(&adjustment.otp_code, now_unix) {
            return Err(ServiceError::Validation(
                "invalid one-time code".to_string(),
            ));
        }

        let transaction_type =
            TransactionType::parse(&adjustment.transaction_type).ok_or_else(|| {
                ServiceError::Validation(format!(
                    "unknown transaction type: {}",
                    adjustment.transaction_type
                ))
            })?;
        let balance_type = BalanceType::parse(&adjustment.balance_type).ok_or_else(|| {
            ServiceError::Validation(format!(
                "unknown balance type: {}",
                adjustment.balance_type
            ))
        })?;

        let user = self
            .users
            .get_user_by_id(&adjustment.user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", adjustment.user_id)))?;

        if !user.is_active {
            return Err(ServiceError::Validation(format!(
                "user {} is not active",
                user.id
            )));
        }

        let reference = self.repository.unique_reference().await?;

        let transaction = self
            .repository
            .admin_create(
                &user.id,
                transaction_type,
                balance_type,
                adjustment.amount,
                &reference,
                adjustment.notes.as_deref(),
            )
            .await?;

        // The adjustment is already committed locally; platform mirroring is
        // best-effort here.
        if let Some((platform_user, platform_account)) = user.platform_account() {
            let is_withdrawal = transaction_type == TransactionType::Withdrawal;
            let receiver_account_id = if is_withdrawal {
                self.main_account_id.clone()
            } else {
                platform_account.to_string()
            };

            let (platform_tx, platform_rx) = oneshot::channel();
            let sent = self
                .platform_channel
                .send(PlatformServiceRequest::TransferMoney {
                    request: TransferMoney {
                        receiver_account_id,
                        sender_user_id: platform_user.to_string(),
                        amount: transaction.amount,
                        currency: transaction.currency.clone(),
                        is_withdrawal,
                        reference: transaction.reference_number.clone(),
                    },
                    response: platform_tx,
                })
                .await;

            match sent {
                Ok(()) => match platform_rx.await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => log::warn!(
                        "Platform transfer failed for admin transaction {}: {}",
                        transaction.id,
                        e
                    ),
                    Err(e) => log::warn!(
                        "Platform service dropped admin transfer {}: {}",
                        transaction.id,
                        e
                    ),
                },
                Err(_) => log::warn!(
                    "Could not reach platform service for admin transaction {}.",
                    transaction.id
                ),
            }
        }

        let _ = self
            .notifier_channel
            .send(NotifierRequest::TransactionEvent(TransactionEvent {
                event: EventKind::Insert,
                transaction_id: transaction.id,
                user_id: transaction.user_id.clone(),
                amount: transaction.amount,
                status: transaction.status.clone(),
            }))
            .await;

        Ok(transaction)
    }
}

#[async_trait]
impl RequestHandler<AdminRequest> for AdminRequestHandler {
    async fn handle_request(&self, request: AdminRequest) {
        match request {
            AdminRequest::CreateTransaction {
                adjustment,
                response,
            } => {
                let result = self.create_transaction(adjustment).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct AdminService;

impl AdminService {
    pub fn new() -> Self {
        AdminService {}
    }
}

#[async_trait]
impl Service<AdminRequest, AdminRequestHandler> for AdminService {}
