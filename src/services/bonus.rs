use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::{mpsc, oneshot, Mutex};

use super::platform::PlatformServiceRequest;
use super::{RequestHandler, Service, ServiceError};
use crate::models::campaigns::{BonusType, Campaign};
use crate::models::platform::TransferMoney;
use crate::models::transactions::Transaction;
use crate::repositories::campaigns::CampaignRepository;
use crate::repositories::checkpoint::CheckpointRepository;
use crate::repositories::transactions::TransactionRepository;
use crate::repositories::users::UserRepository;

pub enum BonusRequest {
    RunBatch {
        response: oneshot::Sender<Result<BonusRunSummary, ServiceError>>,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct BonusRunSummary {
    /// True when another batch already held the run guard.
    pub skipped: bool,
    pub examined: usize,
    pub granted: usize,
    pub checkpoint: i64,
}

/// At most `user_recurrence` grants per user for recurring campaigns; a
/// single grant ever for first-deposit campaigns, and only on the user's
/// chronologically first qualifying deposit. A deposit the campaign has
/// already granted is never granted again, whatever the counters say: a
/// batch that crashed before advancing the checkpoint re-examines the same
/// window on its next run.
fn is_eligible(
    bonus_type: BonusType,
    granted_for_source: bool,
    has_prior_deposit: bool,
    grant_count: i64,
    user_recurrence: i32,
) -> bool {
    if granted_for_source {
        return false;
    }

    match bonus_type {
        BonusType::FirstDepositOnly => !has_prior_deposit && grant_count == 0,
        BonusType::EveryDeposit => grant_count < user_recurrence as i64,
    }
}

/// Where the checkpoint lands after a batch: the highest examined id, never
/// below where it already was, and unmoved when nothing was examined. The
/// decision is independent of how many campaigns were active or how many
/// grants succeeded.
fn next_checkpoint(last_processed: i64, examined_ids: &[i64]) -> Option<i64> {
    examined_ids
        .iter()
        .max()
        .map(|max_id| (*max_id).max(last_processed))
}

#[derive(Clone)]
pub struct BonusRequestHandler {
    repository: TransactionRepository,
    users: UserRepository,
    campaigns: CampaignRepository,
    checkpoint: CheckpointRepository,
    platform_channel: mpsc::Sender<PlatformServiceRequest>,
    run_guard: Arc<Mutex<()>>,
}

impl BonusRequestHandler {
    pub fn new(sql_conn: PgPool, platform_channel: mpsc::Sender<PlatformServiceRequest>) -> Self {
        BonusRequestHandler {
            repository: TransactionRepository::new(sql_conn.clone()),
            users: UserRepository::new(sql_conn.clone()),
            campaigns: CampaignRepository::new(sql_conn.clone()),
            checkpoint: CheckpointRepository::new(sql_conn),
            platform_channel,
            run_guard: Arc::new(Mutex::new(())),
        }
    }

    /// Periodic trigger; the run guard makes an overlapping tick a no-op
    /// rather than a double-crediting hazard.
    pub fn start_scan_task(&self, interval_secs: u64) {
        let handler = self.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            loop {
                interval.tick().await;
                match handler.run_batch().await {
                    Ok(summary) if summary.examined > 0 => {
                        log::info!(
                            "Bonus batch examined {} deposits, granted {} bonuses, checkpoint at {}.",
                            summary.examined,
                            summary.granted,
                            summary.checkpoint
                        );
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("Bonus batch failed: {}", e),
                }
            }
        });
    }

    async fn run_batch(&self) -> Result<BonusRunSummary, ServiceError> {
        // Single-flight: two overlapping runs would both see the same
        // unprocessed window before either advances the checkpoint.
        let Ok(_guard) = self.run_guard.try_lock() else {
            log::warn!("Bonus batch already running; trigger ignored.");
            let checkpoint = self
                .checkpoint
                .last_processed_id()
                .await
                .map_err(|e| ServiceError::Database(e.to_string()))?;
            return Ok(BonusRunSummary {
                skipped: true,
                examined: 0,
                granted: 0,
                checkpoint,
            });
        };

        let last_processed = self
            .checkpoint
            .last_processed_id()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        let deposits = self
            .repository
            .unprocessed_wallet_deposits(last_processed)
            .await?;

        let examined_ids: Vec<i64> = deposits.iter().map(|t| t.id).collect();
        let Some(new_checkpoint) = next_checkpoint(last_processed, &examined_ids) else {
            return Ok(BonusRunSummary {
                skipped: false,
                examined: 0,
                granted: 0,
                checkpoint: last_processed,
            });
        };

        let now = Utc::now().naive_utc();
        let campaigns = self
            .campaigns
            .active_campaigns(now)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        let mut granted = 0;

        for deposit in &deposits {
            for campaign in &campaigns {
                // Isolated per (transaction, campaign): one failure must
                // never halt the batch or block the checkpoint.
                match self.apply_campaign(deposit, campaign).await {
                    Ok(true) => granted += 1,
                    Ok(false) => {}
                    Err(e) => log::error!(
                        "Campaign {} failed for transaction {}: {}",
                        campaign.campaign_id,
                        deposit.id,
                        e
                    ),
                }
            }
        }

        // Examined transactions are covered exactly once, even the ones
        // whose bonus crediting failed above.
        self.checkpoint
            .advance(new_checkpoint, Utc::now().naive_utc())
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        Ok(BonusRunSummary {
            skipped: false,
            examined: deposits.len(),
            granted,
            checkpoint: new_checkpoint,
        })
    }

    async fn apply_campaign(
        &self,
        deposit: &Transaction,
        campaign: &Campaign,
    ) -> Result<bool, ServiceError> {
        if !campaign.audience().includes(&deposit.user_id) {
            return Ok(false);
        }

        let Some(bonus_type) = campaign.bonus_type() else {
            log::warn!(
                "Campaign {} has unknown bonus type '{}'; skipping.",
                campaign.campaign_id,
                campaign.bonus_type
            );
            return Ok(false);
        };

        let granted_for_source = self
            .repository
            .campaign_grant_exists(&campaign.campaign_id, deposit.id)
            .await?;
        let has_prior_deposit = match bonus_type {
            BonusType::FirstDepositOnly => {
                self.repository
                    .has_prior_completed_wallet_deposit(&deposit.user_id, deposit.id)
                    .await?
            }
            BonusType::EveryDeposit => false,
        };
        let grant_count = self
            .repository
            .campaign_grant_count(&deposit.user_id, &campaign.campaign_id)
            .await?;

        if !is_eligible(
            bonus_type,
            granted_for_source,
            has_prior_deposit,
            grant_count,
            campaign.user_recurrence,
        ) {
            return Ok(false);
        }

        let bonus_amount = campaign.bonus_amount(deposit.amount);
        if bonus_amount <= rust_decimal::Decimal::ZERO {
            return Ok(false);
        }

        let bonus = self
            .repository
            .credit_bonus(
                &deposit.user_id,
                &campaign.campaign_id,
                deposit.id,
                bonus_amount,
            )
            .await?;

        // The local ledger is authoritative; platform sync is best-effort
        // and a failure here must not roll the credit back.
        self.sync_bonus_to_platform(&bonus).await;

        Ok(true)
    }

    async fn sync_bonus_to_platform(&self, bonus: &Transaction) {
        let user = match self.users.get_user_by_id(&bonus.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                log::warn!(
                    "Could not load user {} for bonus platform sync: {}",
                    bonus.user_id,
                    e
                );
                return;
            }
        };

        let Some((platform_user, platform_account)) = user.platform_account() else {
            return;
        };

        let (platform_tx, platform_rx) = oneshot::channel();
        let sent = self
            .platform_channel
            .send(PlatformServiceRequest::TransferMoney {
                request: TransferMoney {
                    receiver_account_id: platform_account.to_string(),
                    sender_user_id: platform_user.to_string(),
                    amount: bonus.amount,
                    currency: bonus.currency.clone(),
                    is_withdrawal: false,
                    reference: bonus.reference_number.clone(),
                },
                response: platform_tx,
            })
            .await;

        if sent.is_err() {
            log::warn!(
                "Could not reach platform service to sync bonus {}.",
                bonus.id
            );
            return;
        }

        match platform_rx.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => log::warn!(
                "Platform sync failed for bonus {} (local credit stands): {}",
                bonus.id,
                e
            ),
            Err(e) => log::warn!("Platform service dropped bonus sync {}: {}", bonus.id, e),
        }
    }
}

#[async_trait]
impl RequestHandler<BonusRequest> for BonusRequestHandler {
    async fn handle_request(&self, request: BonusRequest) {
        match request {
            BonusRequest::RunBatch { response } => {
                let result = self.run_batch().await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct BonusService;

impl BonusService {
    pub fn new() -> Self {
        BonusService {}
    }
}

#[async_trait]
impl Service<BonusRequest, BonusRequestHandler> for BonusService {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_deposit_campaign_requires_no_prior_deposit() {
        // Deposit D1 (id=5) is the user's first: eligible.
        assert!(is_eligible(BonusType::FirstDepositOnly, false, false, 0, 1));
        // Deposit D2 (id=9) has D1 before it: never eligible.
        assert!(!is_eligible(BonusType::FirstDepositOnly, false, true, 0, 1));
        // A grant already exists for this campaign: never again.
        assert!(!is_eligible(BonusType::FirstDepositOnly, false, false, 1, 1));
    }

    #[test]
    fn recurring_campaign_caps_at_user_recurrence() {
        // userRecurrence=2: first two qualifying deposits grant, third does
        // not.
        assert!(is_eligible(BonusType::EveryDeposit, false, false, 0, 2));
        assert!(is_eligible(BonusType::EveryDeposit, false, false, 1, 2));
        assert!(!is_eligible(BonusType::EveryDeposit, false, false, 2, 2));
        assert!(!is_eligible(BonusType::EveryDeposit, false, false, 3, 2));
    }

    #[test]
    fn recurring_campaign_ignores_prior_deposit_history() {
        assert!(is_eligible(BonusType::EveryDeposit, false, true, 0, 1));
    }

    #[test]
    fn already_granted_deposit_is_never_regranted() {
        // A crashed run re-examines a deposit it already granted: headroom
        // in the recurrence counter must not let it through a second time.
        assert!(!is_eligible(BonusType::EveryDeposit, true, false, 1, 2));
        assert!(!is_eligible(BonusType::EveryDeposit, true, false, 0, 2));
        assert!(!is_eligible(BonusType::FirstDepositOnly, true, false, 0, 1));
    }

    #[test]
    fn empty_batch_leaves_checkpoint_alone() {
        assert_eq!(next_checkpoint(7, &[]), None);
    }

    #[test]
    fn checkpoint_advances_to_highest_examined_id() {
        assert_eq!(next_checkpoint(0, &[3, 5, 9]), Some(9));
        assert_eq!(next_checkpoint(4, &[5]), Some(5));
    }

    #[test]
    fn checkpoint_never_moves_backwards() {
        assert_eq!(next_checkpoint(12, &[5, 9]), Some(12));
    }
}
