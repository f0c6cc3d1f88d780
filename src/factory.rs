//! Manager construction.
//!
//! All construction goes through [`new_manager`], which takes a
//! [`ProviderSource`] saying whether to configure a fresh federated or
//! external provider or to restore one from persisted configuration.

use crate::cache::SecureCredentialCache;
use crate::client::ServiceClientFactory;
use crate::config::{ConfigStore, ProviderConfig};
use crate::constants::{ENV_AWS_REGION, ENV_IDENTITY_POOL_ID, ENV_REGION};
use crate::identity::IdentityExchangeFactory;
use crate::manager::CredentialLifecycleManager;
use crate::resolver::CredentialResolver;
use crate::store::SecureStore;
use crate::{LocauthError, Region, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A manager shared across tasks; the lock serializes every operation.
pub type SharedManager = Arc<Mutex<CredentialLifecycleManager>>;

/// What to construct.
#[derive(Clone)]
pub enum ProviderSource {
    /// Fresh federated provider for an identity pool.
    Federated {
        identity_pool_id: String,
        region: Region,
    },
    /// Fresh external provider; the resolver may be supplied now or later.
    External {
        region: Region,
        resolver: Option<Arc<dyn CredentialResolver>>,
    },
    /// Provider restored from the configuration persisted by an earlier run.
    Restore,
}

impl ProviderSource {
    pub fn federated(identity_pool_id: impl Into<String>, region: Region) -> Self {
        Self::Federated {
            identity_pool_id: identity_pool_id.into(),
            region,
        }
    }

    pub fn external(region: Region) -> Self {
        Self::External {
            region,
            resolver: None,
        }
    }

    /// Attaches a resolver to an external source. Other sources are returned unchanged.
    pub fn with_resolver(self, resolver: Arc<dyn CredentialResolver>) -> Self {
        match self {
            Self::External { region, .. } => Self::External {
                region,
                resolver: Some(resolver),
            },
            other => other,
        }
    }

    /// Builds a source from the environment.
    ///
    /// - `LOCAUTH_IDENTITY_POOL_ID`: identity pool (federated mode when set)
    /// - `LOCAUTH_REGION`, falling back to `AWS_REGION`: region
    ///
    /// With neither variable set the persisted configuration is restored.
    ///
    /// # Errors
    ///
    /// [`LocauthError::InvalidRegion`] if the region is unknown, or missing
    /// while an identity pool is set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let pool = non_empty(ENV_IDENTITY_POOL_ID);
        let region = non_empty(ENV_REGION).or_else(|| non_empty(ENV_AWS_REGION));

        match (pool, region) {
            (None, None) => Ok(Self::Restore),
            (Some(_), None) => Err(LocauthError::InvalidRegion(format!(
                "{} or {} must be set with {}",
                ENV_REGION, ENV_AWS_REGION, ENV_IDENTITY_POOL_ID
            ))),
            (Some(pool), Some(region)) => Ok(Self::federated(pool, region.parse()?)),
            (None, Some(region)) => Ok(Self::external(region.parse()?)),
        }
    }
}

impl std::fmt::Debug for ProviderSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Federated {
                identity_pool_id,
                region,
            } => f
                .debug_struct("Federated")
                .field("identity_pool_id", identity_pool_id)
                .field("region", region)
                .finish(),
            Self::External { region, resolver } => f
                .debug_struct("External")
                .field("region", region)
                .field("resolver", &resolver.is_some())
                .finish(),
            Self::Restore => f.write_str("Restore"),
        }
    }
}

/// External collaborators a manager is built on.
///
/// The identity exchange factory is only needed in federated mode.
#[derive(Clone)]
pub struct Collaborators {
    store: Arc<dyn SecureStore>,
    clients: Arc<dyn ServiceClientFactory>,
    identity: Option<Arc<dyn IdentityExchangeFactory>>,
}

impl Collaborators {
    /// Collaborators with `store` holding both configuration and credentials.
    pub fn new(store: Arc<dyn SecureStore>, clients: Arc<dyn ServiceClientFactory>) -> Self {
        Self {
            store,
            clients,
            identity: None,
        }
    }

    /// Sets the identity exchange used in federated mode.
    pub fn with_identity_exchange(mut self, factory: Arc<dyn IdentityExchangeFactory>) -> Self {
        self.identity = Some(factory);
        self
    }
}

/// Creates a credential lifecycle manager.
///
/// # Errors
///
/// - [`LocauthError::InvalidIdentityPoolId`]: federated source with an invalid pool id
/// - [`LocauthError::UnsupportedOperation`]: federated source without an identity exchange
/// - [`LocauthError::NoCredentialsFound`]: restore with missing or incomplete configuration
/// - [`LocauthError::CredentialsUnavailable`]: external resolver returned incomplete credentials
///
/// # Example
///
/// ```no_run
/// use locauth::factory::{new_manager, Collaborators, ProviderSource};
/// use locauth::{Region, ServiceClientFactory, IdentityExchangeFactory};
/// use locauth::stores::file::FileStore;
/// use std::sync::Arc;
///
/// async fn run(
///     clients: Arc<dyn ServiceClientFactory>,
///     exchange: Arc<dyn IdentityExchangeFactory>,
/// ) -> locauth::Result<()> {
///     let store = Arc::new(FileStore::new("/tmp/locauth/store.json").await?);
///     let collaborators = Collaborators::new(store, clients).with_identity_exchange(exchange);
///
///     let mut manager = new_manager(
///         ProviderSource::federated("us-east-1:pool", Region::UsEast1),
///         collaborators,
///     )
///     .await?;
///
///     manager.verify_and_refresh_credentials().await?;
///     let _client = manager.get_service_client()?;
///     Ok(())
/// }
/// ```
pub async fn new_manager(
    source: ProviderSource,
    collaborators: Collaborators,
) -> Result<CredentialLifecycleManager> {
    let Collaborators {
        store,
        clients,
        identity,
    } = collaborators;
    let config_store = ConfigStore::new(store.clone());
    let cache = SecureCredentialCache::new(store);

    match source {
        ProviderSource::Federated {
            identity_pool_id,
            region,
        } => {
            let config = ProviderConfig::federated(identity_pool_id, region)?;
            let identity = identity.ok_or_else(|| {
                LocauthError::UnsupportedOperation(
                    "federated mode requires an identity exchange factory".to_string(),
                )
            })?;
            CredentialLifecycleManager::fresh_federated(config, config_store, cache, identity, clients)
                .await
        }
        ProviderSource::External { region, resolver } => {
            CredentialLifecycleManager::fresh_external(
                ProviderConfig::external(region),
                config_store,
                cache,
                resolver,
                clients,
            )
            .await
        }
        ProviderSource::Restore => {
            CredentialLifecycleManager::restore(config_store, cache, identity, clients).await
        }
    }
}

/// Wraps a manager for shared use across tasks.
pub fn into_shared(manager: CredentialLifecycleManager) -> SharedManager {
    Arc::new(Mutex::new(manager))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_env_federated() {
        let source = ProviderSource::from_lookup(lookup(&[
            ("LOCAUTH_IDENTITY_POOL_ID", "pool-1"),
            ("LOCAUTH_REGION", "eu-west-1"),
        ]))
        .unwrap();

        match source {
            ProviderSource::Federated {
                identity_pool_id,
                region,
            } => {
                assert_eq!(identity_pool_id, "pool-1");
                assert_eq!(region, Region::EuWest1);
            }
            other => panic!("expected federated source, got {:?}", other),
        }
    }

    #[test]
    fn test_env_external_uses_aws_region() {
        let source =
            ProviderSource::from_lookup(lookup(&[("AWS_REGION", "us-west-2")])).unwrap();
        assert!(matches!(
            source,
            ProviderSource::External {
                region: Region::UsWest2,
                resolver: None
            }
        ));
    }

    #[test]
    fn test_env_prefers_locauth_region() {
        let source = ProviderSource::from_lookup(lookup(&[
            ("LOCAUTH_REGION", "ap-south-1"),
            ("AWS_REGION", "us-west-2"),
        ]))
        .unwrap();
        assert!(matches!(
            source,
            ProviderSource::External {
                region: Region::ApSouth1,
                ..
            }
        ));
    }

    #[test]
    fn test_env_empty_restores() {
        let source = ProviderSource::from_lookup(lookup(&[("LOCAUTH_REGION", "  ")])).unwrap();
        assert!(matches!(source, ProviderSource::Restore));
    }

    #[test]
    fn test_env_pool_without_region() {
        let result =
            ProviderSource::from_lookup(lookup(&[("LOCAUTH_IDENTITY_POOL_ID", "pool-1")]));
        assert!(matches!(result, Err(LocauthError::InvalidRegion(_))));
    }

    #[test]
    fn test_env_unknown_region() {
        let result = ProviderSource::from_lookup(lookup(&[("AWS_REGION", "moon-1")]));
        assert!(matches!(result, Err(LocauthError::InvalidRegion(_))));
    }
}
