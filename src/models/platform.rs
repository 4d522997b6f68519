use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferMoney {
    pub receiver_account_id: String,
    pub sender_user_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub is_withdrawal: bool,
    pub reference: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub amount: Decimal,
    pub bank_id: String,
    pub comment: String,
    pub external_user_id: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashRequest {
    pub amount: Decimal,
    pub comment: String,
    pub external_user_id: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOutcome {
    pub success: bool,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub message: String,
}
