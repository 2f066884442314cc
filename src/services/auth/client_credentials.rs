use async_trait::async_trait;
use serde::Deserialize;

use super::{Credential, CredentialProvider};
use crate::errors::SyncError;
use crate::services::read_json;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct ClientCredentialsProvider {
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    client: reqwest::Client,
}

impl ClientCredentialsProvider {
    pub fn new(
        client: reqwest::Client,
        token_url: String,
        client_id: String,
        client_secret: String,
        scope: String,
    ) -> Self {
        Self {
            token_url,
            client_id,
            client_secret,
            scope,
            client,
        }
    }

    async fn request_token(&self) -> Result<TokenResponse, SyncError> {
        let resp = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", self.scope.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        read_json(resp, "token request").await
    }
}

#[async_trait]
impl CredentialProvider for ClientCredentialsProvider {
    async fn get_token(&self) -> Result<Credential, SyncError> {
        let token = self.request_token().await.map_err(|e| match e {
            SyncError::Credential(_) => e,
            other => SyncError::Credential(other.to_string()),
        })?;
        if token.access_token.trim().is_empty() {
            return Err(SyncError::Credential(
                "token endpoint returned an empty access_token".to_string(),
            ));
        }

        tracing::debug!("acquired booking API token");
        Ok(Credential::new(token.access_token))
    }
}
