use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::platform::{
    CashRequest, DepositRequest, RequestOutcome, TransferMoney, TransferOutcome,
};
use crate::repositories::platform::PlatformRepository;
use crate::settings;

pub enum PlatformServiceRequest {
    TransferMoney {
        request: TransferMoney,
        response: oneshot::Sender<Result<TransferOutcome, ServiceError>>,
    },
    CreateDepositRequest {
        request: DepositRequest,
        response: oneshot::Sender<Result<RequestOutcome, ServiceError>>,
    },
    CreateCashRequest {
        request: CashRequest,
        response: oneshot::Sender<Result<RequestOutcome, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct PlatformRequestHandler {
    repository: PlatformRepository,
}

impl PlatformRequestHandler {
    pub fn new(settings: &settings::Platform) -> Self {
        let repository = PlatformRepository::new(settings);

        PlatformRequestHandler { repository }
    }

    async fn transfer_money(
        &self,
        request: &TransferMoney,
    ) -> Result<TransferOutcome, ServiceError> {
        let outcome = self
            .repository
            .transfer_money(request)
            .await
            .map_err(|e| ServiceError::ExternalGateway(e.to_string()))?;

        if !outcome.success {
            return Err(ServiceError::ExternalGateway(outcome.message));
        }

        Ok(outcome)
    }

    async fn create_deposit_request(
        &self,
        request: &DepositRequest,
    ) -> Result<RequestOutcome, ServiceError> {
        self.repository
            .create_deposit_request(request)
            .await
            .map_err(|e| ServiceError::ExternalGateway(e.to_string()))
    }

    async fn create_cash_request(
        &self,
        request: &CashRequest,
    ) -> Result<RequestOutcome, ServiceError> {
        self.repository
            .create_cash_request(request)
            .await
            .map_err(|e| ServiceError::ExternalGateway(e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<PlatformServiceRequest> for PlatformRequestHandler {
    async fn handle_request(&self, request: PlatformServiceRequest) {
        match request {
            PlatformServiceRequest::TransferMoney { request, response } => {
                let result = self.transfer_money(&request).await;
                let _ = response.send(result);
            }
            PlatformServiceRequest::CreateDepositRequest { request, response } => {
                let result = self.create_deposit_request(&request).await;
                let _ = response.send(result);
            }
            PlatformServiceRequest::CreateCashRequest { request, response } => {
                let result = self.create_cash_request(&request).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct PlatformService;

impl PlatformService {
    pub fn new() -> Self {
        PlatformService {}
    }
}

#[async_trait]
impl Service<PlatformServiceRequest, PlatformRequestHandler> for PlatformService {}
