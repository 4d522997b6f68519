use crate::models::platform::{
    CashRequest, DepositRequest, RequestOutcome, TransferMoney, TransferOutcome,
};
use crate::settings;

mod api;

/// Gateway to the external trading platform. Every call can fail or time
/// out; the caller decides whether that aborts the operation (deposit and
/// withdrawal approval) or is logged and survived (bonus payout sync).
#[derive(Clone)]
pub struct PlatformRepository {
    api: api::PlatformApi,
}

impl PlatformRepository {
    pub fn new(settings: &settings::Platform) -> Self {
        let api = api::PlatformApi::new(
            settings.url.clone(),
            settings.auth_token.clone(),
            settings.timeout_secs,
        );

        PlatformRepository { api }
    }

    pub async fn transfer_money(
        &self,
        request: &TransferMoney,
    ) -> Result<TransferOutcome, anyhow::Error> {
        self.api.transfer_money(request).await
    }

    pub async fn create_deposit_request(
        &self,
        request: &DepositRequest,
    ) -> Result<RequestOutcome, anyhow::Error> {
        self.api.create_deposit_request(request).await
    }

    pub async fn create_cash_request(
        &self,
        request: &CashRequest,
    ) -> Result<RequestOutcome, anyhow::Error> {
        self.api.create_cash_request(request).await
    }
}
