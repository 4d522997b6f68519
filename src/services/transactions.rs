use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::{mpsc, oneshot};

use super::notifier::NotifierRequest;
use super::platform::PlatformServiceRequest;
use super::{RequestHandler, Service, ServiceError};
use crate::models::notifications::{EmailMessage, EventKind, TransactionEvent};
use crate::models::platform::{CashRequest, DepositRequest, TransferMoney};
use crate::models::transactions::{
    BalanceType, NewDeposit, NewWithdrawal, Transaction, TransactionStatus, TransactionType,
};
use crate::models::users::{User, UserBalances};
use crate::repositories::transactions::{LedgerError, TransactionRepository};
use crate::repositories::users::UserRepository;

pub enum TransactionServiceRequest {
    CreateDeposit {
        request: NewDeposit,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
    CreateWithdrawal {
        request: NewWithdrawal,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
    TransitionDeposit {
        transaction_id: i64,
        new_status: String,
        admin_notes: Option<String>,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
    TransitionWithdrawal {
        transaction_id: i64,
        new_status: String,
        mtr_number: Option<String>,
        admin_notes: Option<String>,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
    GetTransaction {
        transaction_id: i64,
        response: oneshot::Sender<Result<Option<Transaction>, ServiceError>>,
    },
    ListUserTransactions {
        user_id: String,
        response: oneshot::Sender<Result<Vec<Transaction>, ServiceError>>,
    },
    GetUserBalances {
        user_id: String,
        response: oneshot::Sender<Result<UserBalances, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct TransactionRequestHandler {
    repository: TransactionRepository,
    users: UserRepository,
    platform_channel: mpsc::Sender<PlatformServiceRequest>,
    notifier_channel: mpsc::Sender<NotifierRequest>,
    main_account_id: String,
}

impl TransactionRequestHandler {
    pub fn new(
        sql_conn: PgPool,
        platform_channel: mpsc::Sender<PlatformServiceRequest>,
        notifier_channel: mpsc::Sender<NotifierRequest>,
        main_account_id: String,
    ) -> Self {
        let repository = TransactionRepository::new(sql_conn.clone());
        let users = UserRepository::new(sql_conn);

        TransactionRequestHandler {
            repository,
            users,
            platform_channel,
            notifier_channel,
            main_account_id,
        }
    }

    async fn active_user(&self, user_id: &str) -> Result<User, ServiceError> {
        let user = self
            .users
            .get_user_by_id(user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", user_id)))?;

        if !user.is_active {
            return Err(ServiceError::Validation(format!(
                "user {} is not active",
                user.id
            )));
        }

        Ok(user)
    }

    async fn create_deposit(&self, request: NewDeposit) -> Result<Transaction, ServiceError> {
        if request.mtr_number.trim().is_empty() {
            return Err(ServiceError::Validation(
                "deposit requires an MTR/UTR reference".to_string(),
            ));
        }

        let user = self.active_user(&request.user_id).await?;

        let transaction = self
            .repository
            .create_deposit(
                &user,
                request.amount,
                &request.mtr_number,
                request.notes.as_deref(),
            )
            .await?;

        // Registering the request with the platform is best-effort; the
        // pending ledger row is already the source of truth.
        if let Some((platform_user, _)) = user.platform_account() {
            self.register_deposit_request(&transaction, platform_user)
                .await;
        }

        self.emit_event(&transaction, EventKind::Insert).await;

        Ok(transaction)
    }

    async fn create_withdrawal(&self, request: NewWithdrawal) -> Result<Transaction, ServiceError> {
        let balance_type = BalanceType::parse(&request.balance_type).ok_or_else(|| {
            ServiceError::Validation(format!("unknown balance type: {}", request.balance_type))
        })?;

        let user = self.active_user(&request.user_id).await?;

        let transaction = self
            .repository
            .create_withdrawal(&user.id, balance_type, request.amount, request.notes.as_deref())
            .await?;

        if let Some((platform_user, _)) = user.platform_account() {
            self.register_cash_request(&transaction, platform_user).await;
        }

        self.emit_event(&transaction, EventKind::Insert).await;

        Ok(transaction)
    }

    async fn transition_deposit(
        &self,
        transaction_id: i64,
        new_status: &str,
        admin_notes: Option<String>,
    ) -> Result<Transaction, ServiceError> {
        let status = TransactionStatus::parse(new_status)
            .ok_or_else(|| ServiceError::Validation(format!("unknown status: {}", new_status)))?;

        let transaction = self
            .repository
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("transaction {}", transaction_id)))?;

        if transaction.transaction_type() != Some(TransactionType::Deposit) {
            return Err(ServiceError::NotFound(format!(
                "deposit transaction {}",
                transaction_id
            )));
        }

        let updated = match status {
            TransactionStatus::Completed => {
                if transaction.status() == Some(TransactionStatus::Completed) {
                    return Err(ServiceError::AlreadyProcessed(format!(
                        "deposit {} is already completed",
                        transaction_id
                    )));
                }

                let user = self.active_user(&transaction.user_id).await?;

                // Gateway first, with the ledger reference as idempotency
                // key: a crediting failure after this point is logged for
                // reconciliation instead of silently diverging.
                if user.platform_account().is_some() {
                    self.transfer(&user, &transaction, false).await?;
                }

                let updated = self
                    .repository
                    .complete_deposit(transaction_id, admin_notes.as_deref())
                    .await
                    .map_err(|e| {
                        if let LedgerError::Database(_) = &e {
                            log::error!(
                                "Deposit {} credited on platform (reference {}) but local commit failed; needs reconciliation: {}",
                                transaction_id,
                                transaction.reference_number,
                                e
                            );
                        }
                        ServiceError::from(e)
                    })?;

                self.send_approval_email(&user, &updated).await;
                updated
            }
            other => {
                self.repository
                    .update_deposit_status(transaction_id, other, admin_notes.as_deref())
                    .await?
            }
        };

        self.emit_event(&updated, EventKind::Update).await;

        Ok(updated)
    }

    async fn transition_withdrawal(
        &self,
        transaction_id: i64,
        new_status: &str,
        mtr_number: Option<String>,
        admin_notes: Option<String>,
    ) -> Result<Transaction, ServiceError> {
        let status = TransactionStatus::parse(new_status)
            .ok_or_else(|| ServiceError::Validation(format!("unknown status: {}", new_status)))?;

        let transaction = self
            .repository
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("transaction {}", transaction_id)))?;

        if transaction.transaction_type() != Some(TransactionType::Withdrawal) {
            return Err(ServiceError::NotFound(format!(
                "withdrawal transaction {}",
                transaction_id
            )));
        }

        let updated = match status {
            TransactionStatus::Completed => {
                if transaction.status() == Some(TransactionStatus::Completed) {
                    return Err(ServiceError::AlreadyProcessed(format!(
                        "withdrawal {} is already completed",
                        transaction_id
                    )));
                }

                let user = self.active_user(&transaction.user_id).await?;

                // The debit happened at request time; approval only moves
                // the funds out on the platform and records the MTR. A
                // gateway failure leaves the withdrawal pending.
                if user.platform_account().is_some() {
                    self.transfer(&user, &transaction, true).await?;
                }

                let updated = self
                    .repository
                    .approve_withdrawal(
                        transaction_id,
                        mtr_number.as_deref(),
                        admin_notes.as_deref(),
                    )
                    .await?;

                self.send_approval_email(&user, &updated).await;
                updated
            }
            TransactionStatus::Rejected => {
                if transaction.status() == Some(TransactionStatus::Rejected) {
                    return Err(ServiceError::AlreadyProcessed(format!(
                        "withdrawal {} is already rejected",
                        transaction_id
                    )));
                }

                let (rejected, reversal) = self
                    .repository
                    .reject_withdrawal(transaction_id, admin_notes.as_deref())
                    .await?;

                self.emit_event(&reversal, EventKind::Insert).await;
                rejected
            }
            other => {
                self.repository
                    .update_withdrawal_status(transaction_id, other, admin_notes.as_deref())
                    .await?
            }
        };

        self.emit_event(&updated, EventKind::Update).await;

        Ok(updated)
    }

    /// Synchronous gateway transfer tied to an approval; failure aborts the
    /// transition.
    async fn transfer(
        &self,
        user: &User,
        transaction: &Transaction,
        is_withdrawal: bool,
    ) -> Result<(), ServiceError> {
        let (platform_user, platform_account) = user
            .platform_account()
            .ok_or_else(|| ServiceError::Internal("missing platform account".to_string()))?;

        let receiver_account_id = if is_withdrawal {
            self.main_account_id.clone()
        } else {
            platform_account.to_string()
        };

        let (platform_tx, platform_rx) = oneshot::channel();
        self.platform_channel
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
            .await
            .map_err(|e| {
                ServiceError::Communication("Transaction => Platform".to_string(), e.to_string())
            })?;

        platform_rx
            .await
            .map_err(|e| {
                ServiceError::Communication("Platform => Transaction".to_string(), e.to_string())
            })?
            .map(|_| ())
    }

    async fn register_deposit_request(&self, transaction: &Transaction, platform_user: &str) {
        let (platform_tx, platform_rx) = oneshot::channel();
        let sent = self
            .platform_channel
            .send(PlatformServiceRequest::CreateDepositRequest {
                request: DepositRequest {
                    amount: transaction.amount,
                    bank_id: transaction.mtr_number.clone().unwrap_or_default(),
                    comment: format!("Deposit request {}", transaction.reference_number),
                    external_user_id: platform_user.to_string(),
                },
                response: platform_tx,
            })
            .await;

        if sent.is_err() {
            log::warn!(
                "Could not reach platform service for deposit request {}",
                transaction.id
            );
            return;
        }

        match platform_rx.await {
            Ok(Ok(outcome)) => {
                if let Some(request_id) = outcome.request_id {
                    if let Err(e) = self
                        .repository
                        .set_platform_request_ref(transaction.id, &request_id)
                        .await
                    {
                        log::warn!(
                            "Could not record platform request ref for deposit {}: {}",
                            transaction.id,
                            e
                        );
                    }
                }
            }
            Ok(Err(e)) => log::warn!(
                "Platform deposit request failed for transaction {}: {}",
                transaction.id,
                e
            ),
            Err(e) => log::warn!(
                "Platform service dropped deposit request {}: {}",
                transaction.id,
                e
            ),
        }
    }

    async fn register_cash_request(&self, transaction: &Transaction, platform_user: &str) {
        let (platform_tx, platform_rx) = oneshot::channel();
        let sent = self
            .platform_channel
            .send(PlatformServiceRequest::CreateCashRequest {
                request: CashRequest {
                    amount: transaction.amount,
                    comment: format!("Withdrawal request {}", transaction.reference_number),
                    external_user_id: platform_user.to_string(),
                },
                response: platform_tx,
            })
            .await;

        if sent.is_err() {
            log::warn!(
                "Could not reach platform service for cash request {}",
                transaction.id
            );
            return;
        }

        match platform_rx.await {
            Ok(Ok(outcome)) => {
                if let Some(request_id) = outcome.request_id {
                    if let Err(e) = self
                        .repository
                        .set_platform_request_ref(transaction.id, &request_id)
                        .await
                    {
                        log::warn!(
                            "Could not record platform request ref for withdrawal {}: {}",
                            transaction.id,
                            e
                        );
                    }
                }
            }
            Ok(Err(e)) => log::warn!(
                "Platform cash request failed for transaction {}: {}",
                transaction.id,
                e
            ),
            Err(e) => log::warn!(
                "Platform service dropped cash request {}: {}",
                transaction.id,
                e
            ),
        }
    }

    async fn emit_event(&self, transaction: &Transaction, event: EventKind) {
        let _ = self
            .notifier_channel
            .send(NotifierRequest::TransactionEvent(TransactionEvent {
                event,
                transaction_id: transaction.id,
                user_id: transaction.user_id.clone(),
                amount: transaction.amount,
                status: transaction.status.clone(),
            }))
            .await;
    }

    async fn send_approval_email(&self, user: &User, transaction: &Transaction) {
        let Some(email) = &user.email else {
            return;
        };

        let kind = match transaction.transaction_type() {
            Some(TransactionType::Withdrawal) => "withdrawal",
            _ => "deposit",
        };

        let _ = self
            .notifier_channel
            .send(NotifierRequest::Email(EmailMessage {
                to: email.clone(),
                subject: format!("Your {} has been approved", kind),
                body: format!(
                    "Your {} of {} {} (reference {}) has been approved.",
                    kind, transaction.amount, transaction.currency, transaction.reference_number
                ),
            }))
            .await;
    }
}

#[async_trait]
impl RequestHandler<TransactionServiceRequest> for TransactionRequestHandler {
    async fn handle_request(&self, request: TransactionServiceRequest) {
        match request {
            TransactionServiceRequest::CreateDeposit { request, response } => {
                let result = self.create_deposit(request).await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::CreateWithdrawal { request, response } => {
                let result = self.create_withdrawal(request).await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::TransitionDeposit {
                transaction_id,
                new_status,
                admin_notes,
                response,
            } => {
                let result = self
                    .transition_deposit(transaction_id, &new_status, admin_notes)
                    .await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::TransitionWithdrawal {
                transaction_id,
                new_status,
                mtr_number,
                admin_notes,
                response,
            } => {
                let result = self
                    .transition_withdrawal(transaction_id, &new_status, mtr_number, admin_notes)
                    .await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::GetTransaction {
                transaction_id,
                response,
            } => {
                let result = self
                    .repository
                    .get_transaction(transaction_id)
                    .await
                    .map_err(ServiceError::from);
                let _ = response.send(result);
            }
            TransactionServiceRequest::ListUserTransactions { user_id, response } => {
                let result = self
                    .repository
                    .list_user_transactions(&user_id, 50)
                    .await
                    .map_err(ServiceError::from);
                let _ = response.send(result);
            }
            TransactionServiceRequest::GetUserBalances { user_id, response } => {
                let result = self
                    .users
                    .get_user_by_id(&user_id)
                    .await
                    .map_err(|e| ServiceError::Database(e.to_string()))
                    .and_then(|user| {
                        user.map(|u| UserBalances::from(&u))
                            .ok_or_else(|| ServiceError::NotFound(format!("user {}", user_id)))
                    });
                let _ = response.send(result);
            }
        }
    }
}

pub struct TransactionService;

impl TransactionService {
    pub fn new() -> Self {
        TransactionService {}
    }
}

#[async_trait]
impl Service<TransactionServiceRequest, TransactionRequestHandler> for TransactionService {}
