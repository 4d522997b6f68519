use std::time::Duration;

use anyhow::bail;
use reqwest;
use uuid::Uuid;

use crate::models::platform::{
    CashRequest, DepositRequest, RequestOutcome, TransferMoney, TransferOutcome,
};

#[derive(Clone)]
pub struct PlatformApi {
    url: String,
    auth_token: String,
    client: reqwest::Client,
}

impl PlatformApi {
    pub fn new(url: String, auth_token: String, timeout_secs: u64) -> Self {
        // The timeout classifies a stalled gateway as a failure instead of
        // holding the approval path open indefinitely.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            url,
            auth_token,
            client,
        }
    }

    pub async fn transfer_money(
        &self,
        request: &TransferMoney,
    ) -> Result<TransferOutcome, anyhow::Error> {
        let nonce = Uuid::new_v4().hyphenated().to_string();
        let response = self
            .client
            .post(format!("{}/api/transfer", self.url))
            .bearer_auth(&self.auth_token)
            .header("X-Nonce", nonce)
            .json(request)
            .send()
            .await?
            .text()
            .await?;

        let response_json: serde_json::Value = serde_json::from_str(&response)?;
        match response_json.get("response") {
            Some(r) => {
                let outcome: TransferOutcome = serde_json::from_value(r.clone())?;
                Ok(outcome)
            }
            None => bail!("Platform: Bad response format."),
        }
    }

    pub async fn create_deposit_request(
        &self,
        request: &DepositRequest,
    ) -> Result<RequestOutcome, anyhow::Error> {
        self.post_request("/api/deposit-request", serde_json::to_value(request)?)
            .await
    }

    pub async fn create_cash_request(
        &self,
        request: &CashRequest,
    ) -> Result<RequestOutcome, anyhow::Error> {
        self.post_request("/api/cash-request", serde_json::to_value(request)?)
            .await
    }

    async fn post_request(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<RequestOutcome, anyhow::Error> {
        let nonce = Uuid::new_v4().hyphenated().to_string();
        let response = self
            .client
            .post(format!("{}{}", self.url, path))
            .bearer_auth(&self.auth_token)
            .header("X-Nonce", nonce)
            .json(&payload)
            .send()
            .await?
            .text()
            .await?;

        let response_json: serde_json::Value = serde_json::from_str(&response)?;
        match response_json.get("response") {
            Some(r) => {
                let outcome: RequestOutcome = serde_json::from_value(r.clone())?;
                Ok(outcome)
            }
            None => bail!("Platform: Bad response format."),
        }
    }
}
