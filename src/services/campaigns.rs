use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::campaigns::{Campaign, NewCampaign};
use crate::repositories::campaigns::CampaignRepository;

pub enum CampaignRequest {
    CreateCampaign {
        new: NewCampaign,
        response: oneshot::Sender<Result<Campaign, ServiceError>>,
    },
    ListCampaigns {
        response: oneshot::Sender<Result<Vec<Campaign>, ServiceError>>,
    },
    ListActiveCampaigns {
        response: oneshot::Sender<Result<Vec<Campaign>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct CampaignRequestHandler {
    repository: CampaignRepository,
}

impl CampaignRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        CampaignRequestHandler {
            repository: CampaignRepository::new(sql_conn),
        }
    }

    async fn create_campaign(&self, new: NewCampaign) -> Result<Campaign, ServiceError> {
        new.validate().map_err(ServiceError::Validation)?;

        self.repository
            .insert_campaign(&new)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>, ServiceError> {
        self.repository
            .list_campaigns()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn list_active_campaigns(&self) -> Result<Vec<Campaign>, ServiceError> {
        self.repository
            .active_campaigns(Utc::now().naive_utc())
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<CampaignRequest> for CampaignRequestHandler {
    async fn handle_request(&self, request: CampaignRequest) {
        match request {
            CampaignRequest::CreateCampaign { new, response } => {
                let result = self.create_campaign(new).await;
                let _ = response.send(result);
            }
            CampaignRequest::ListCampaigns { response } => {
                let result = self.list_campaigns().await;
                let _ = response.send(result);
            }
            CampaignRequest::ListActiveCampaigns { response } => {
                let result = self.list_active_campaigns().await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct CampaignService;

impl CampaignService {
    pub fn new() -> Self {
        CampaignService {}
    }
}

#[async_trait]
impl Service<CampaignRequest, CampaignRequestHandler> for CampaignService {}
