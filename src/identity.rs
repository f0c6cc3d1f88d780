//! Identity exchange collaborator.
//!
//! The federated flow is a two-step protocol: resolve a logical identity for
//! an identity pool, then exchange that identity for temporary credentials.

use crate::{CredentialRecord, Region, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Credentials exactly as the exchange returned them.
///
/// Any field may be missing; [`into_record`](Self::into_record) decides
/// whether the response is usable.
#[derive(Clone, Default, PartialEq)]
pub struct ExchangedCredentials {
    pub access_key_id: Option<String>,
    pub secret_key: Option<String>,
    pub session_token: Option<String>,
    /// Epoch seconds
    pub expiration: Option<f64>,
}

impl ExchangedCredentials {
    /// Returns the record if every field is present and non-empty.
    pub fn into_record(self) -> Option<CredentialRecord> {
        CredentialRecord::new(
            self.access_key_id?,
            self.secret_key?,
            self.session_token?,
            self.expiration?,
        )
    }
}

impl std::fmt::Debug for ExchangedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Client for the identity exchange service.
///
/// No timeout or cancellation is applied by callers; a hung request hangs
/// the operation awaiting it.
#[async_trait]
pub trait IdentityExchangeClient: Send + Sync {
    /// Resolves the identity id for an identity pool.
    ///
    /// `Ok(None)` means the service answered without an identity.
    async fn resolve_identity(&self, identity_pool_id: &str) -> Result<Option<String>>;

    /// Exchanges an identity id for temporary credentials.
    async fn exchange_for_credentials(&self, identity_id: &str) -> Result<ExchangedCredentials>;
}

/// Builds identity exchange clients for a region.
#[async_trait]
pub trait IdentityExchangeFactory: Send + Sync {
    async fn build(&self, region: Region) -> Result<Arc<dyn IdentityExchangeClient>>;
}
