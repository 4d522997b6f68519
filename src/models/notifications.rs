use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize)]
pub enum EventKind {
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
}

/// Fire-and-forget live event pushed to the user's channel and to all
/// admins; delivery is never load-bearing for ledger state.
#[derive(Clone, Debug, Serialize)]
pub struct TransactionEvent {
    pub event: EventKind,
    pub transaction_id: i64,
    pub user_id: String,
    pub amount: Decimal,
    pub status: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}
