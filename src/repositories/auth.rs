use anyhow::bail;
use reqwest;

use crate::models::auth::AuthContext;

/// Client for the authentication collaborator: bearer credential in,
/// authorization ground truth out.
#[derive(Clone)]
pub struct AuthApi {
    url: String,
    client: reqwest::Client,
}

impl AuthApi {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn authenticate(&self, bearer: &str) -> Result<AuthContext, anyhow::Error> {
        let response = self
            .client
            .get(format!("{}/api/session", self.url))
            .bearer_auth(bearer)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Auth: credential rejected ({})", response.status());
        }

        let context: AuthContext = response.json().await?;
        Ok(context)
    }
}
