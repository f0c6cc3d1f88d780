//! Externally supplied credential resolvers.

use crate::{ResolvedCredentials, Result};
use async_trait::async_trait;

/// Caller-provided source of credentials for external mode.
///
/// The resolver is owned by the caller and may be invoked any number of
/// times; each call should return the freshest credentials it has.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self) -> Result<ResolvedCredentials>;
}

/// Resolver that always returns the same credentials.
#[derive(Clone, Debug)]
pub struct StaticResolver {
    credentials: ResolvedCredentials,
}

impl StaticResolver {
    pub fn new(credentials: ResolvedCredentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialResolver for StaticResolver {
    async fn resolve(&self) -> Result<ResolvedCredentials> {
        Ok(self.credentials.clone())
    }
}
