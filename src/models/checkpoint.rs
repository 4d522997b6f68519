use chrono::NaiveDateTime;
use serde::Serialize;

/// Single evolving row: the last ledger id the bonus processor has examined.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ProcessingCheckpoint {
    pub id: i64,
    pub last_processed_transaction_id: i64,
    pub last_processed_at: Option<NaiveDateTime>,
}
