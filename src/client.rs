//! Target service client seam and the credential sources handed to it.
//!
//! A service client never receives a credential snapshot. It receives a
//! [`CredentialSource`] and pulls credentials from it when it signs a call,
//! so rotating credentials in the cache is visible to an already built client.

use crate::cache::SecureCredentialCache;
use crate::resolver::CredentialResolver;
use crate::{CredentialRecord, LocauthError, Region, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Pull-based credential source, invoked at call time.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn credentials(&self) -> Result<CredentialRecord>;
}

/// Client for the target service.
pub trait ServiceClient: Send + Sync {
    /// Region the client talks to.
    fn region(&self) -> Region;
}

/// Builds service clients.
pub trait ServiceClientFactory: Send + Sync {
    fn build(
        &self,
        region: Region,
        source: Arc<dyn CredentialSource>,
    ) -> Result<Arc<dyn ServiceClient>>;
}

/// Reads the federated credential cache on every call.
#[derive(Clone)]
pub struct CachedCredentialSource {
    cache: SecureCredentialCache,
}

impl CachedCredentialSource {
    pub fn new(cache: SecureCredentialCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl CredentialSource for CachedCredentialSource {
    async fn credentials(&self) -> Result<CredentialRecord> {
        self.cache
            .load()
            .await
            .ok_or(LocauthError::CredentialsUnavailable)
    }
}

/// Invokes an external resolver on every call.
#[derive(Clone)]
pub struct ResolverCredentialSource {
    resolver: Arc<dyn CredentialResolver>,
}

impl ResolverCredentialSource {
    pub fn new(resolver: Arc<dyn CredentialResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl CredentialSource for ResolverCredentialSource {
    async fn credentials(&self) -> Result<CredentialRecord> {
        self.resolver
            .resolve()
            .await?
            .into_record()
            .ok_or(LocauthError::CredentialsUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StaticResolver;
    use crate::stores::memory::MemoryStore;
    use crate::ResolvedCredentials;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_cached_source_reads_current_cache() {
        let cache = SecureCredentialCache::new(Arc::new(MemoryStore::new()));
        let source = CachedCredentialSource::new(cache.clone());

        assert!(matches!(
            source.credentials().await,
            Err(LocauthError::CredentialsUnavailable)
        ));

        let first = CredentialRecord::new("A1", "S1", "T1", 1.0e9).unwrap();
        cache.save(&first).await.unwrap();
        assert_eq!(source.credentials().await.unwrap(), first);

        let second = CredentialRecord::new("A2", "S2", "T2", 2.0e9).unwrap();
        cache.save(&second).await.unwrap();
        assert_eq!(source.credentials().await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_resolver_source() {
        let resolved = ResolvedCredentials {
            access_key_id: "A".to_string(),
            secret_access_key: "S".to_string(),
            session_token: Some("T".to_string()),
            expiration: Some(Utc::now() + Duration::minutes(5)),
        };
        let source = ResolverCredentialSource::new(Arc::new(StaticResolver::new(resolved)));

        let record = source.credentials().await.unwrap();
        assert_eq!(record.access_key_id, "A");
        assert!(record.is_valid());
    }

    #[tokio::test]
    async fn test_resolver_source_incomplete() {
        let resolved = ResolvedCredentials {
            access_key_id: "A".to_string(),
            secret_access_key: "S".to_string(),
            session_token: None,
            expiration: None,
        };
        let source = ResolverCredentialSource::new(Arc::new(StaticResolver::new(resolved)));

        assert!(matches!(
            source.credentials().await,
            Err(LocauthError::CredentialsUnavailable)
        ));
    }
}
