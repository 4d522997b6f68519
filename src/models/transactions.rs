use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "deposit" => Some(TransactionType::Deposit),
            "withdrawal" => Some(TransactionType::Withdrawal),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceType {
    Wallet,
    Bonus,
}

impl BalanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceType::Wallet => "wallet",
            BalanceType::Bonus => "bonus",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "wallet" => Some(BalanceType::Wallet),
            "bonus" => Some(BalanceType::Bonus),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Verification,
    Completed,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Verification => "verification",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TransactionStatus::Pending),
            "verification" => Some(TransactionStatus::Verification),
            "completed" => Some(TransactionStatus::Completed),
            "rejected" => Some(TransactionStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Rejected
        )
    }

    /// Lifecycle guard: `completed` and `rejected` are terminal, everything
    /// else may move to any of the four states.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        !self.is_terminal() && *self != next
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub reference_number: String,
    pub transaction_type: String,
    pub balance_type: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub closing_balance: Option<Decimal>,
    pub bonus_portion: Decimal,
    pub mtr_number: Option<String>,
    pub platform_request_ref: Option<String>,
    pub campaign_code: Option<String>,
    pub source_transaction_id: Option<i64>,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub approved_at: Option<NaiveDateTime>,
}

impl Transaction {
    pub fn status(&self) -> Option<TransactionStatus> {
        TransactionStatus::parse(&self.status)
    }

    pub fn transaction_type(&self) -> Option<TransactionType> {
        TransactionType::parse(&self.transaction_type)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewDeposit {
    pub user_id: String,
    pub amount: Decimal,
    pub mtr_number: String,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewWithdrawal {
    pub user_id: String,
    pub balance_type: String,
    pub amount: Decimal,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_cannot_transition() {
        assert!(!TransactionStatus::Completed.can_transition_to(TransactionStatus::Rejected));
        assert!(!TransactionStatus::Completed.can_transition_to(TransactionStatus::Pending));
        assert!(!TransactionStatus::Rejected.can_transition_to(TransactionStatus::Completed));
    }

    #[test]
    fn pending_can_reach_all_other_states() {
        assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Verification));
        assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Completed));
        assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Rejected));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Verification,
            TransactionStatus::Completed,
            TransactionStatus::Rejected,
        ] {
            assert_eq!(TransactionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TransactionStatus::parse("approved"), None);
    }
}
