pub mod client_credentials;

use std::fmt;

use async_trait::async_trait;

use crate::errors::SyncError;

/// Bearer token for the booking API. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_token(&self) -> Result<Credential, SyncError>;
}
