use async_trait::async_trait;

use super::{RequestHandler, Service};
use crate::models::notifications::{EmailMessage, TransactionEvent};
use crate::repositories::notifications::NotifierApi;
use crate::settings;

/// Fire-and-forget by contract: a failed push or email is logged and never
/// surfaces to the operation that emitted it.
pub enum NotifierRequest {
    TransactionEvent(TransactionEvent),
    Email(EmailMessage),
}

#[derive(Clone)]
pub struct NotifierRequestHandler {
    api: NotifierApi,
}

impl NotifierRequestHandler {
    pub fn new(settings: &settings::Notifier) -> Self {
        NotifierRequestHandler {
            api: NotifierApi::new(settings),
        }
    }
}

#[async_trait]
impl RequestHandler<NotifierRequest> for NotifierRequestHandler {
    async fn handle_request(&self, request: NotifierRequest) {
        match request {
            NotifierRequest::TransactionEvent(event) => {
                if let Err(e) = self.api.push_event(&event).await {
                    log::warn!(
                        "Could not push event for transaction {}: {}",
                        event.transaction_id,
                        e
                    );
                }
            }
            NotifierRequest::Email(message) => {
                if let Err(e) = self.api.send_email(&message).await {
                    log::warn!("Could not send email to {}: {}", message.to, e);
                }
            }
        }
    }
}

pub struct NotifierService;

impl NotifierService {
    pub fn new() -> Self {
        NotifierService {}
    }
}

#[async_trait]
impl Service<NotifierRequest, NotifierRequestHandler> for NotifierService {}
