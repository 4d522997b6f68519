use reqwest;

use crate::models::notifications::{EmailMessage, TransactionEvent};
use crate::settings;

/// Relay client for live events and email. Both are fire-and-forget from
/// the ledger's point of view.
#[derive(Clone)]
pub struct NotifierApi {
    event_url: String,
    mailer_url: String,
    client: reqwest::Client,
}

impl NotifierApi {
    pub fn new(settings: &settings::Notifier) -> Self {
        Self {
            event_url: settings.event_url.clone(),
            mailer_url: settings.mailer_url.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn push_event(&self, event: &TransactionEvent) -> Result<(), anyhow::Error> {
        self.client
            .post(&self.event_url)
            .json(event)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    pub async fn send_email(&self, message: &EmailMessage) -> Result<(), anyhow::Error> {
        self.client
            .post(&self.mailer_url)
            .json(message)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
