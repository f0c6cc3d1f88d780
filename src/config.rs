//! Provider configuration and its persistence.

use crate::constants::{IDENTITY_POOL_ID, METHOD, METHOD_EXTERNAL, METHOD_FEDERATED, REGION};
use crate::store::SecureStore;
use crate::validation::validate_identity_pool_id;
use crate::{LocauthError, Region, Result};
use std::str::FromStr;
use std::sync::Arc;

/// Where credentials come from.
///
/// The mode is fixed when a provider is first constructed and persisted
/// alongside the rest of the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialMode {
    /// Credentials obtained through the identity exchange for an identity pool
    Federated,
    /// Credentials supplied by a caller-provided resolver
    External,
}

impl std::fmt::Display for CredentialMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Federated => write!(f, "{}", METHOD_FEDERATED),
            Self::External => write!(f, "{}", METHOD_EXTERNAL),
        }
    }
}

impl FromStr for CredentialMode {
    type Err = LocauthError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            METHOD_FEDERATED => Ok(Self::Federated),
            METHOD_EXTERNAL => Ok(Self::External),
            _ => Err(LocauthError::NoCredentialsFound),
        }
    }
}

/// Persisted provider configuration.
///
/// `identity_pool_id` is set exactly when the mode is federated; the
/// constructors enforce this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    mode: CredentialMode,
    identity_pool_id: Option<String>,
    region: Region,
}

impl ProviderConfig {
    /// Federated configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use locauth::{CredentialMode, ProviderConfig, Region};
    ///
    /// let config = ProviderConfig::federated("pool-1", Region::UsEast1).unwrap();
    /// assert_eq!(config.mode(), CredentialMode::Federated);
    /// assert_eq!(config.identity_pool_id(), Some("pool-1"));
    /// ```
    pub fn federated(identity_pool_id: impl Into<String>, region: Region) -> Result<Self> {
        let identity_pool_id = identity_pool_id.into();
        validate_identity_pool_id(&identity_pool_id)?;

        Ok(Self {
            mode: CredentialMode::Federated,
            identity_pool_id: Some(identity_pool_id),
            region,
        })
    }

    /// External configuration.
    pub fn external(region: Region) -> Self {
        Self {
            mode: CredentialMode::External,
            identity_pool_id: None,
            region,
        }
    }

    pub fn mode(&self) -> CredentialMode {
        self.mode
    }

    pub fn identity_pool_id(&self) -> Option<&str> {
        self.identity_pool_id.as_deref()
    }

    pub fn region(&self) -> Region {
        self.region
    }
}

/// Reads and writes [`ProviderConfig`] in a secure store.
#[derive(Clone)]
pub struct ConfigStore {
    store: Arc<dyn SecureStore>,
}

impl ConfigStore {
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        Self { store }
    }

    /// Persists `config` in one batch, each key written once.
    ///
    /// A stale identity pool id from an earlier federated configuration is
    /// removed after an external one has been written. A leftover id is
    /// harmless: reads only consult it in federated mode.
    pub async fn write(&self, config: &ProviderConfig) -> Result<()> {
        let method = config.mode.to_string();
        let region = config.region.name();

        match config.identity_pool_id() {
            Some(pool) => {
                self.store
                    .put_all(&[(METHOD, method.as_str()), (IDENTITY_POOL_ID, pool), (REGION, region)])
                    .await
            }
            None => {
                self.store
                    .put_all(&[(METHOD, method.as_str()), (REGION, region)])
                    .await?;
                self.store.remove(IDENTITY_POOL_ID).await
            }
        }
    }

    /// Reads the persisted configuration.
    ///
    /// # Errors
    ///
    /// - [`LocauthError::NoCredentialsFound`]: no mode persisted, an unknown
    ///   mode, or a field the mode requires is missing
    /// - [`LocauthError::InvalidRegion`]: the persisted region is not known
    /// - any error from the store
    pub async fn read(&self) -> Result<ProviderConfig> {
        let method = self
            .store
            .get(METHOD)
            .await?
            .ok_or(LocauthError::NoCredentialsFound)?;
        let mode = method.parse::<CredentialMode>()?;

        let region = self
            .store
            .get(REGION)
            .await?
            .filter(|r| !r.is_empty())
            .ok_or(LocauthError::NoCredentialsFound)?
            .parse::<Region>()?;

        match mode {
            CredentialMode::Federated => {
                let pool = self
                    .store
                    .get(IDENTITY_POOL_ID)
                    .await?
                    .filter(|p| !p.is_empty())
                    .ok_or(LocauthError::NoCredentialsFound)?;
                ProviderConfig::federated(pool, region)
            }
            CredentialMode::External => Ok(ProviderConfig::external(region)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::memory::MemoryStore;

    fn config_store(store: &MemoryStore) -> ConfigStore {
        ConfigStore::new(Arc::new(store.clone()))
    }

    #[test]
    fn test_mode_tags() {
        assert_eq!(CredentialMode::Federated.to_string(), "cognito");
        assert_eq!(CredentialMode::External.to_string(), "custom");
        assert_eq!("cognito".parse::<CredentialMode>().unwrap(), CredentialMode::Federated);
        assert!(matches!(
            "apiKey".parse::<CredentialMode>(),
            Err(LocauthError::NoCredentialsFound)
        ));
    }

    #[test]
    fn test_federated_requires_valid_pool() {
        assert!(ProviderConfig::federated("", Region::UsEast1).is_err());
        assert!(ProviderConfig::external(Region::UsEast1).identity_pool_id().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read_federated() {
        let store = MemoryStore::new();
        let configs = config_store(&store);
        let config = ProviderConfig::federated("pool-1", Region::UsEast1).unwrap();

        configs.write(&config).await.unwrap();

        assert_eq!(configs.read().await.unwrap(), config);
        assert_eq!(store.get(METHOD).await.unwrap().as_deref(), Some("cognito"));
        assert_eq!(store.get(REGION).await.unwrap().as_deref(), Some("us-east-1"));
        for key in [METHOD, IDENTITY_POOL_ID, REGION] {
            assert_eq!(store.write_count(key).await, 1, "{key}");
        }
    }

    #[tokio::test]
    async fn test_external_overwrites_stale_pool() {
        let store = MemoryStore::new();
        let configs = config_store(&store);
        configs
            .write(&ProviderConfig::federated("pool-1", Region::UsEast1).unwrap())
            .await
            .unwrap();

        configs.write(&ProviderConfig::external(Region::EuWest1)).await.unwrap();

        let read = configs.read().await.unwrap();
        assert_eq!(read.mode(), CredentialMode::External);
        assert_eq!(read.region(), Region::EuWest1);
        assert_eq!(store.get(IDENTITY_POOL_ID).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_config() {
        let store = MemoryStore::new();
        let configs = config_store(&store);
        let federated = ProviderConfig::federated("pool-1", Region::UsEast1).unwrap();
        configs.write(&federated).await.unwrap();

        store.fail_puts(Some("locked")).await;
        assert!(configs.write(&ProviderConfig::external(Region::EuWest1)).await.is_err());

        assert_eq!(configs.read().await.unwrap(), federated);
    }

    #[tokio::test]
    async fn test_read_missing_config() {
        let store = MemoryStore::new();
        assert!(matches!(
            config_store(&store).read().await,
            Err(LocauthError::NoCredentialsFound)
        ));
    }

    #[tokio::test]
    async fn test_read_federated_missing_pool() {
        let store = MemoryStore::new();
        store.seed(METHOD, "cognito").await;
        store.seed(REGION, "us-east-1").await;

        assert!(matches!(
            config_store(&store).read().await,
            Err(LocauthError::NoCredentialsFound)
        ));
    }

    #[tokio::test]
    async fn test_read_missing_region() {
        let store = MemoryStore::new();
        store.seed(METHOD, "custom").await;

        assert!(matches!(
            config_store(&store).read().await,
            Err(LocauthError::NoCredentialsFound)
        ));
    }

    #[tokio::test]
    async fn test_read_unknown_mode() {
        let store = MemoryStore::new();
        store.seed(METHOD, "apiKey").await;
        store.seed(REGION, "us-east-1").await;

        assert!(matches!(
            config_store(&store).read().await,
            Err(LocauthError::NoCredentialsFound)
        ));
    }
}
