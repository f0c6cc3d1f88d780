//! Amazon Cognito identity exchange.
//!
//! Implements [`IdentityExchangeClient`] with the official AWS SDK:
//! `GetId` resolves the identity, `GetCredentialsForIdentity` exchanges it.
//!
//! # Example
//!
//! ```no_run
//! use locauth::cognito::CognitoExchangeFactory;
//! use locauth::factory::{new_manager, Collaborators, ProviderSource};
//! use locauth::stores::memory::MemoryStore;
//! use locauth::{Region, ServiceClientFactory};
//! use std::sync::Arc;
//!
//! async fn run(clients: Arc<dyn ServiceClientFactory>) -> locauth::Result<()> {
//!     let collaborators = Collaborators::new(Arc::new(MemoryStore::new()), clients)
//!         .with_identity_exchange(Arc::new(CognitoExchangeFactory::new()));
//!
//!     let mut manager = new_manager(
//!         ProviderSource::federated("us-east-1:00000000-0000-0000-0000-000000000000", Region::UsEast1),
//!         collaborators,
//!     )
//!     .await?;
//!     manager.verify_and_refresh_credentials().await?;
//!     Ok(())
//! }
//! ```

use crate::identity::{ExchangedCredentials, IdentityExchangeClient, IdentityExchangeFactory};
use crate::{LocauthError, Region, Result};
use async_trait::async_trait;
use aws_sdk_cognitoidentity::Client;
use std::sync::Arc;
use tracing::debug;

/// Cognito identity exchange client.
pub struct CognitoExchange {
    client: Client,
    region: Region,
}

impl CognitoExchange {
    /// Builds a client for `region`, optionally against a custom endpoint
    /// (for LocalStack testing).
    pub async fn new(region: Region, endpoint: Option<&str>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.name()));

        if let Some(endpoint) = endpoint {
            config_loader = config_loader.endpoint_url(endpoint);
        }

        let config = config_loader.load().await;
        Self {
            client: Client::new(&config),
            region,
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }
}

#[async_trait]
impl IdentityExchangeClient for CognitoExchange {
    async fn resolve_identity(&self, identity_pool_id: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get_id()
            .identity_pool_id(identity_pool_id)
            .send()
            .await
            .map_err(|e| LocauthError::Other(anyhow::anyhow!("Cognito GetId failed: {}", e)))?;

        debug!(region = %self.region, "resolved cognito identity");
        Ok(response.identity_id().map(str::to_string))
    }

    async fn exchange_for_credentials(&self, identity_id: &str) -> Result<ExchangedCredentials> {
        let response = self
            .client
            .get_credentials_for_identity()
            .identity_id(identity_id)
            .send()
            .await
            .map_err(|e| {
                LocauthError::Other(anyhow::anyhow!(
                    "Cognito GetCredentialsForIdentity failed: {}",
                    e
                ))
            })?;

        let Some(credentials) = response.credentials() else {
            return Ok(ExchangedCredentials::default());
        };

        Ok(ExchangedCredentials {
            access_key_id: credentials.access_key_id().map(str::to_string),
            secret_key: credentials.secret_key().map(str::to_string),
            session_token: credentials.session_token().map(str::to_string),
            expiration: credentials.expiration().map(|d| d.as_secs_f64()),
        })
    }
}

/// Builds [`CognitoExchange`] clients.
#[derive(Debug, Clone, Default)]
pub struct CognitoExchangeFactory {
    endpoint: Option<String>,
}

impl CognitoExchangeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom endpoint for every client built.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

#[async_trait]
impl IdentityExchangeFactory for CognitoExchangeFactory {
    async fn build(&self, region: Region) -> Result<Arc<dyn IdentityExchangeClient>> {
        Ok(Arc::new(
            CognitoExchange::new(region, self.endpoint.as_deref()).await,
        ))
    }
}
