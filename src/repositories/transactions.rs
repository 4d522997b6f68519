use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::transactions::{BalanceType, Transaction, TransactionStatus, TransactionType};
use crate::models::users::User;

const REFERENCE_ATTEMPTS: u32 = 10;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(i64),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Transaction already processed")]
    AlreadyProcessed,
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Could not allocate a unique reference number")]
    ReferenceAllocation,
}

/// How a withdrawal debit splits across the two pools. Bonus balance is
/// always drained before wallet balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WithdrawalPlan {
    pub bonus_portion: Decimal,
    pub wallet_portion: Decimal,
    pub wallet_after: Decimal,
    pub bonus_after: Decimal,
    pub closing_balance: Decimal,
}

pub fn plan_withdrawal(
    wallet: Decimal,
    bonus: Decimal,
    balance_type: BalanceType,
    amount: Decimal,
) -> Result<WithdrawalPlan, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }

    match balance_type {
        BalanceType::Bonus => {
            if bonus < amount {
                return Err(LedgerError::InsufficientFunds);
            }
            let bonus_after = bonus - amount;
            Ok(WithdrawalPlan {
                bonus_portion: amount,
                wallet_portion: Decimal::ZERO,
                wallet_after: wallet,
                bonus_after,
                closing_balance: bonus_after,
            })
        }
        BalanceType::Wallet => {
            // Pre-check against the combined pool; the bonus pool covers as
            // much of the debit as it can before the wallet is touched.
            if wallet + bonus < amount {
                return Err(LedgerError::InsufficientFunds);
            }
            let bonus_portion = bonus.min(amount);
            let wallet_portion = amount - bonus_portion;
            let wallet_after = wallet - wallet_portion;
            Ok(WithdrawalPlan {
                bonus_portion,
                wallet_portion,
                wallet_after,
                bonus_after: bonus - bonus_portion,
                closing_balance: wallet_after,
            })
        }
    }
}

/// Split of a rejected withdrawal's refund across the two pools: the
/// recorded bonus portion returns to the bonus pool, the remainder to the
/// wallet.
pub fn reversal_credit(amount: Decimal, bonus_portion: Decimal) -> (Decimal, Decimal) {
    let bonus_back = bonus_portion;
    let wallet_back = amount - bonus_back;
    (wallet_back, bonus_back)
}

#[derive(Clone)]
pub struct TransactionRepository {
    conn: PgPool,
}

impl TransactionRepository {
    pub fn new(conn: PgPool) -> Self {
        TransactionRepository { conn }
    }

    pub async fn get_transaction(&self, id: i64) -> Result<Option<Transaction>, LedgerError> {
        let transaction =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.conn)
                .await?;

        Ok(transaction)
    }

    pub async fn list_user_transactions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE user_id = $1 ORDER BY id DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.conn)
        .await?;

        Ok(transactions)
    }

    /// Deposit requests only create the pending ledger row; the wallet is
    /// credited when the deposit is approved.
    pub async fn create_deposit(
        &self,
        user: &User,
        amount: Decimal,
        mtr_number: &str,
        notes: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let reference = Uuid::new_v4().hyphenated().to_string();
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"INSERT INTO transactions
            (user_id, reference_number, transaction_type, balance_type, amount, currency, status, mtr_number, notes)
            VALUES ($1, $2, 'deposit', 'wallet', $3, $4, 'pending', $5, $6)
            RETURNING *"#,
        )
        .bind(&user.id)
        .bind(&reference)
        .bind(amount)
        .bind(&user.currency)
        .bind(mtr_number)
        .bind(notes)
        .fetch_one(&self.conn)
        .await?;

        Ok(transaction)
    }

    /// Withdrawal requests debit the pool(s) immediately; approval later
    /// performs no further debit.
    pub async fn create_withdrawal(
        &self,
        user_id: &str,
        balance_type: BalanceType,
        amount: Decimal,
        notes: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        let mut db = self.conn.begin().await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *db)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;

        let plan = plan_withdrawal(user.balance, user.bonus_balance, balance_type, amount)?;

        sqlx::query(
            "UPDATE users SET balance = $1, bonus_balance = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3",
        )
        .bind(plan.wallet_after)
        .bind(plan.bonus_after)
        .bind(&user.id)
        .execute(&mut *db)
        .await?;

        let reference = Uuid::new_v4().hyphenated().to_string();
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"INSERT INTO transactions
            (user_id, reference_number, transaction_type, balance_type, amount, currency, status, closing_balance, bonus_portion, notes)
            VALUES ($1, $2, 'withdrawal', $3, $4, $5, 'pending', $6, $7, $8)
            RETURNING *"#,
        )
        .bind(&user.id)
        .bind(balance_type.as_str())
        .bind(amount)
        .bind(&user.currency)
        .bind(plan.closing_balance)
        .bind(plan.bonus_portion)
        .bind(notes)
        .fetch_one(&mut *db)
        .await?;

        db.commit().await?;

        Ok(transaction)
    }

    /// Approval credit: one atomic unit covering the wallet increment, the
    /// closing-balance snapshot and the status flip. The idempotency guard
    /// runs under the row lock so two concurrent approvals cannot both
    /// credit.
    pub async fn complete_deposit(
        &self,
        id: i64,
        admin_notes: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        let mut db = self.conn.begin().await?;

        let transaction = self.lock_transaction(&mut db, id).await?;
        if transaction.transaction_type() != Some(TransactionType::Deposit) {
            return Err(LedgerError::TransactionNotFound(id));
        }
        if transaction.status().map_or(true, |s| s.is_terminal()) {
            return Err(LedgerError::AlreadyProcessed);
        }

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(&transaction.user_id)
            .fetch_optional(&mut *db)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(transaction.user_id.clone()))?;

        let new_balance = user.balance + transaction.amount;

        sqlx::query("UPDATE users SET balance = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
            .bind(new_balance)
            .bind(&user.id)
            .execute(&mut *db)
            .await?;

        let updated = sqlx::query_as::<_, Transaction>(
            r#"UPDATE transactions
            SET status = 'completed', closing_balance = $1, admin_notes = COALESCE($2, admin_notes),
                approved_at = $3, updated_at = CURRENT_TIMESTAMP
            WHERE id = $4
            RETURNING *"#,
        )
        .bind(new_balance)
        .bind(admin_notes)
        .bind(Utc::now().naive_utc())
        .bind(id)
        .fetch_one(&mut *db)
        .await?;

        db.commit().await?;

        Ok(updated)
    }

    /// Non-crediting deposit transitions (verification, rejected): status
    /// and notes only, no balance change.
    pub async fn update_deposit_status(
        &self,
        id: i64,
        status: TransactionStatus,
        admin_notes: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        let mut db = self.conn.begin().await?;

        let transaction = self.lock_transaction(&mut db, id).await?;
        if transaction.transaction_type() != Some(TransactionType::Deposit) {
            return Err(LedgerError::TransactionNotFound(id));
        }
        if transaction
            .status()
            .map_or(true, |s| !s.can_transition_to(status))
        {
            return Err(LedgerError::AlreadyProcessed);
        }

        let updated = sqlx::query_as::<_, Transaction>(
            r#"UPDATE transactions
            SET status = $1, admin_notes = COALESCE($2, admin_notes), updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *"#,
        )
        .bind(status.as_str())
        .bind(admin_notes)
        .bind(id)
        .fetch_one(&mut *db)
        .await?;

        db.commit().await?;

        Ok(updated)
    }

    /// Withdrawal approval records the MTR and timestamps only; the debit
    /// happened at request time.
    pub async fn approve_withdrawal(
        &self,
        id: i64,
        mtr_number: Option<&str>,
        admin_notes: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        let mut db = self.conn.begin().await?;

        let transaction = self.lock_transaction(&mut db, id).await?;
        if transaction.transaction_type() != Some(TransactionType::Withdrawal) {
            return Err(LedgerError::TransactionNotFound(id));
        }
        if transaction.status().map_or(true, |s| s.is_terminal()) {
            return Err(LedgerError::AlreadyProcessed);
        }

        let updated = sqlx::query_as::<_, Transaction>(
            r#"UPDATE transactions
            SET status = 'completed', mtr_number = COALESCE($1, mtr_number),
                admin_notes = COALESCE($2, admin_notes), approved_at = $3, updated_at = CURRENT_TIMESTAMP
            WHERE id = $4
            RETURNING *"#,
        )
        .bind(mtr_number)
        .bind(admin_notes)
        .bind(Utc::now().naive_utc())
        .bind(id)
        .fetch_one(&mut *db)
        .await?;

        db.commit().await?;

        Ok(updated)
    }

    pub async fn update_withdrawal_status(
        &self,
        id: i64,
        status: TransactionStatus,
        admin_notes: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        let mut db = self.conn.begin().await?;

        let transaction = self.lock_transaction(&mut db, id).await?;
        if transaction.transaction_type() != Some(TransactionType::Withdrawal) {
            return Err(LedgerError::TransactionNotFound(id));
        }
        if transaction
            .status()
            .map_or(true, |s| !s.can_transition_to(status))
        {
            return Err(LedgerError::AlreadyProcessed);
        }

        let updated = sqlx::query_as::<_, Transaction>(
            r#"UPDATE transactions
            SET status = $1, admin_notes = COALESCE($2, admin_notes), updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *"#,
        )
        .bind(status.as_str())
        .bind(admin_notes)
        .bind(id)
        .fetch_one(&mut *db)
        .await?;

        db.commit().await?;

        Ok(updated)
    }

    /// Rejection reverses the original debit exactly once: the bonus portion
    /// goes back to the bonus pool, the remainder to the wallet, and a
    /// linked reversal deposit row is written for audit traceability.
    pub async fn reject_withdrawal(
        &self,
        id: i64,
        admin_notes: Option<&str>,
    ) -> Result<(Transaction, Transaction), LedgerError> {
        let mut db = self.conn.begin().await?;

        let transaction = self.lock_transaction(&mut db, id).await?;
        if transaction.transaction_type() != Some(TransactionType::Withdrawal) {
            return Err(LedgerError::TransactionNotFound(id));
        }
        if transaction.status().map_or(true, |s| s.is_terminal()) {
            return Err(LedgerError::AlreadyProcessed);
        }

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(&transaction.user_id)
            .fetch_optional(&mut *db)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(transaction.user_id.clone()))?;

        let (wallet_back, bonus_back) = reversal_credit(transaction.amount, transaction.bonus_portion);
        let wallet_after = user.balance + wallet_back;
        let bonus_after = user.bonus_balance + bonus_back;

        sqlx::query(
            "UPDATE users SET balance = $1, bonus_balance = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3",
        )
        .bind(wallet_after)
        .bind(bonus_after)
        .bind(&user.id)
        .execute(&mut *db)
        .await?;

        let rejected = sqlx::query_as::<_, Transaction>(
            r#"UPDATE transactions
            SET status = 'rejected', admin_notes = COALESCE($1, admin_notes), updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *"#,
        )
        .bind(admin_notes)
        .bind(id)
        .fetch_one(&mut *db)
        .await?;

        // The reversal row carries the same pool split as the withdrawal it
        // undoes, so the audit trail reconstructs exactly: amount minus
        // bonus_portion reached the wallet, the rest the bonus pool.
        let reference = Uuid::new_v4().hyphenated().to_string();
        let reversal = sqlx::query_as::<_, Transaction>(
            r#"INSERT INTO transactions
            (user_id, reference_number, transaction_type, balance_type, amount, currency, status, closing_balance, bonus_portion, source_transaction_id, notes, approved_at)
            VALUES ($1, $2, 'deposit', 'wallet', $3, $4, 'completed', $5, $6, $7, $8, $9)
            RETURNING *"#,
        )
        .bind(&user.id)
        .bind(&reference)
        .bind(transaction.amount)
        .bind(&transaction.currency)
        .bind(wallet_after)
        .bind(bonus_back)
        .bind(transaction.id)
        .bind(format!("Reversal of withdrawal #{}", transaction.id))
        .bind(Utc::now().naive_utc())
        .fetch_one(&mut *db)
        .await?;

        db.commit().await?;

        Ok((rejected, reversal))
    }

    /// Admin-authorized manual adjustment: no pending phase, the named pool
    /// alone covers withdrawals, and the row lands `completed` in the same
    /// unit as the balance delta.
    pub async fn admin_create(
        &self,
        user_id: &str,
        transaction_type: TransactionType,
        balance_type: BalanceType,
        amount: Decimal,
        reference: &str,
        notes: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let mut db = self.conn.begin().await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *db)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;

        let pool_balance = match balance_type {
            BalanceType::Wallet => user.balance,
            BalanceType::Bonus => user.bonus_balance,
        };

        let closing = match transaction_type {
            TransactionType::Deposit => pool_balance + amount,
            TransactionType::Withdrawal => {
                if pool_balance < amount {
                    return Err(LedgerError::InsufficientFunds);
                }
                pool_balance - amount
            }
        };

        let column = match balance_type {
            BalanceType::Wallet => "balance",
            BalanceType::Bonus => "bonus_balance",
        };
        sqlx::query(&format!(
            "UPDATE users SET {} = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
            column
        ))
        .bind(closing)
        .bind(&user.id)
        .execute(&mut *db)
        .await?;

        let bonus_portion = match (transaction_type, balance_type) {
            (TransactionType::Withdrawal, BalanceType::Bonus) => amount,
            _ => Decimal::ZERO,
        };

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"INSERT INTO transactions
            (user_id, reference_number, transaction_type, balance_type, amount, currency, status, closing_balance, bonus_portion, notes, approved_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'completed', $7, $8, $9, $10)
            RETURNING *"#,
        )
        .bind(&user.id)
        .bind(reference)
        .bind(transaction_type.as_str())
        .bind(balance_type.as_str())
        .bind(amount)
        .bind(&user.currency)
        .bind(closing)
        .bind(bonus_portion)
        .bind(notes)
        .bind(Utc::now().naive_utc())
        .fetch_one(&mut *db)
        .await?;

        db.commit().await?;

        Ok(transaction)
    }

    pub async fn set_platform_request_ref(
        &self,
        id: i64,
        request_ref: &str,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            "UPDATE transactions SET platform_request_ref = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
        )
        .bind(request_ref)
        .bind(id)
        .execute(&self.conn)
        .await?;

        Ok(())
    }

    pub async fn unique_reference(&self) -> Result<String, LedgerError> {
        for _ in 0..REFERENCE_ATTEMPTS {
            let candidate = format!("ADM-{}", Uuid::new_v4().hyphenated());
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM transactions WHERE reference_number = $1)",
            )
            .bind(&candidate)
            .fetch_one(&self.conn)
            .await?;

            if !taken {
                return Ok(candidate);
            }
        }

        Err(LedgerError::ReferenceAllocation)
    }

    /// Completed wallet deposits past the checkpoint, strictly ascending by
    /// id. Ascending order is the correctness backbone of the bonus batch.
    pub async fn unprocessed_wallet_deposits(
        &self,
        after_id: i64,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"SELECT * FROM transactions
            WHERE id > $1 AND transaction_type = 'deposit' AND status = 'completed' AND balance_type = 'wallet'
            ORDER BY id ASC"#,
        )
        .bind(after_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(transactions)
    }

    pub async fn has_prior_completed_wallet_deposit(
        &self,
        user_id: &str,
        before_id: i64,
    ) -> Result<bool, LedgerError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                SELECT 1 FROM transactions
                WHERE user_id = $1 AND id < $2
                  AND transaction_type = 'deposit' AND status = 'completed' AND balance_type = 'wallet'
            )"#,
        )
        .bind(user_id)
        .bind(before_id)
        .fetch_one(&self.conn)
        .await?;

        Ok(exists)
    }

    pub async fn campaign_grant_count(
        &self,
        user_id: &str,
        campaign_code: &str,
    ) -> Result<i64, LedgerError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(1) FROM transactions WHERE user_id = $1 AND campaign_code = $2",
        )
        .bind(user_id)
        .bind(campaign_code)
        .fetch_one(&self.conn)
        .await?;

        Ok(count)
    }

    /// Whether this (campaign, source deposit) pair has already been granted.
    /// A batch that crashed before advancing the checkpoint re-examines the
    /// same deposits; this lookup is what keeps the re-run from crediting
    /// them again.
    pub async fn campaign_grant_exists(
        &self,
        campaign_code: &str,
        source_transaction_id: i64,
    ) -> Result<bool, LedgerError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                SELECT 1 FROM transactions
                WHERE campaign_code = $1 AND source_transaction_id = $2
            )"#,
        )
        .bind(campaign_code)
        .bind(source_transaction_id)
        .fetch_one(&self.conn)
        .await?;

        Ok(exists)
    }

    /// Mint a campaign bonus: bonus-pool credit and the tagged bonus ledger
    /// row land in one unit, so a (transaction, campaign) pair can never be
    /// half-granted.
    pub async fn credit_bonus(
        &self,
        user_id: &str,
        campaign_code: &str,
        source_transaction_id: i64,
        amount: Decimal,
    ) -> Result<Transaction, LedgerError> {
        let mut db = self.conn.begin().await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *db)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;

        let bonus_after = user.bonus_balance + amount;

        sqlx::query(
            "UPDATE users SET bonus_balance = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
        )
        .bind(bonus_after)
        .bind(&user.id)
        .execute(&mut *db)
        .await?;

        // The unique index on (campaign_code, source_transaction_id) turns a
        // racing duplicate grant into an insert error, rolling the credit
        // back with it.
        let reference = Uuid::new_v4().hyphenated().to_string();
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"INSERT INTO transactions
            (user_id, reference_number, transaction_type, balance_type, amount, currency, status, closing_balance, campaign_code, source_transaction_id, notes, approved_at)
            VALUES ($1, $2, 'deposit', 'bonus', $3, $4, 'completed', $5, $6, $7, $8, $9)
            RETURNING *"#,
        )
        .bind(&user.id)
        .bind(&reference)
        .bind(amount)
        .bind(&user.currency)
        .bind(bonus_after)
        .bind(campaign_code)
        .bind(source_transaction_id)
        .bind(format!(
            "Campaign {} bonus for deposit #{}",
            campaign_code, source_transaction_id
        ))
        .bind(Utc::now().naive_utc())
        .fetch_one(&mut *db)
        .await?;

        db.commit().await?;

        Ok(transaction)
    }

    async fn lock_transaction(
        &self,
        db: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: i64,
    ) -> Result<Transaction, LedgerError> {
        sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **db)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_withdrawal_drains_bonus_first() {
        let plan = plan_withdrawal(
            Decimal::from(100),
            Decimal::from(20),
            BalanceType::Wallet,
            Decimal::from(50),
        )
        .unwrap();

        assert_eq!(plan.bonus_portion, Decimal::from(20));
        assert_eq!(plan.wallet_portion, Decimal::from(30));
        assert_eq!(plan.wallet_after, Decimal::from(70));
        assert_eq!(plan.bonus_after, Decimal::ZERO);
        assert_eq!(plan.closing_balance, Decimal::from(70));
    }

    #[test]
    fn combined_pool_check_runs_before_any_debit() {
        // Wallet 0, bonus 20, request 50: combined pool is short, so the
        // request must fail outright instead of driving the wallet negative.
        let result = plan_withdrawal(
            Decimal::ZERO,
            Decimal::from(20),
            BalanceType::Wallet,
            Decimal::from(50),
        );
        assert!(matches!(result, Err(LedgerError::InsufficientFunds)));
    }

    #[test]
    fn exact_combined_pool_is_allowed() {
        let plan = plan_withdrawal(
            Decimal::from(30),
            Decimal::from(20),
            BalanceType::Wallet,
            Decimal::from(50),
        )
        .unwrap();

        assert_eq!(plan.bonus_portion, Decimal::from(20));
        assert_eq!(plan.wallet_after, Decimal::ZERO);
        assert_eq!(plan.bonus_after, Decimal::ZERO);
    }

    #[test]
    fn bonus_pool_withdrawal_never_touches_wallet() {
        let plan = plan_withdrawal(
            Decimal::from(100),
            Decimal::from(40),
            BalanceType::Bonus,
            Decimal::from(25),
        )
        .unwrap();

        assert_eq!(plan.bonus_portion, Decimal::from(25));
        assert_eq!(plan.wallet_portion, Decimal::ZERO);
        assert_eq!(plan.wallet_after, Decimal::from(100));
        assert_eq!(plan.closing_balance, Decimal::from(15));
    }

    #[test]
    fn bonus_pool_withdrawal_rejects_overdraw_even_with_wallet_funds() {
        let result = plan_withdrawal(
            Decimal::from(100),
            Decimal::from(10),
            BalanceType::Bonus,
            Decimal::from(25),
        );
        assert!(matches!(result, Err(LedgerError::InsufficientFunds)));
    }

    #[test]
    fn non_positive_amounts_are_invalid() {
        for amount in [Decimal::ZERO, Decimal::from(-5)] {
            let result = plan_withdrawal(
                Decimal::from(100),
                Decimal::from(10),
                BalanceType::Wallet,
                amount,
            );
            assert!(matches!(result, Err(LedgerError::InvalidAmount)));
        }
    }

    #[test]
    fn reversal_split_restores_exactly_the_debit() {
        let plan = plan_withdrawal(
            Decimal::from(100),
            Decimal::from(20),
            BalanceType::Wallet,
            Decimal::from(50),
        )
        .unwrap();

        let (wallet_back, bonus_back) = reversal_credit(Decimal::from(50), plan.bonus_portion);
        assert_eq!(wallet_back + bonus_back, Decimal::from(50));
        assert_eq!(wallet_back, plan.wallet_portion);
        assert_eq!(bonus_back, plan.bonus_portion);
        assert_eq!(plan.wallet_after + wallet_back, Decimal::from(100));
        assert_eq!(plan.bonus_after + bonus_back, Decimal::from(20));
    }

    #[test]
    fn reversal_split_of_pure_wallet_withdrawal_has_no_bonus_portion() {
        let (wallet_back, bonus_back) = reversal_credit(Decimal::from(40), Decimal::ZERO);
        assert_eq!(wallet_back, Decimal::from(40));
        assert_eq!(bonus_back, Decimal::ZERO);
    }
}
