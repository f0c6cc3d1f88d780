//! Credential lifecycle manager.
//!
//! The manager selects a credential source, validates cached state, triggers
//! regeneration when the cache is missing or expired, and lazily builds the
//! target service client, discarding it whenever credentials rotate.
//!
//! Construction goes through [`factory::new_manager`](crate::factory::new_manager).
//!
//! # Concurrency
//!
//! Every operation that can mutate state takes `&mut self`, so calls on one
//! manager are serialized by the borrow checker. To share a manager across
//! tasks wrap it in [`SharedManager`](crate::factory::SharedManager). The
//! exchange calls carry no timeout; a hung exchange hangs the awaiting call.
//! Use [`RefreshMonitor`] to see an in-flight exchange from another task.

use crate::cache::SecureCredentialCache;
use crate::client::{
    CachedCredentialSource, CredentialSource, ResolverCredentialSource, ServiceClient,
    ServiceClientFactory,
};
use crate::config::{ConfigStore, CredentialMode, ProviderConfig};
use crate::identity::{IdentityExchangeClient, IdentityExchangeFactory};
use crate::resolver::CredentialResolver;
use crate::slot::LazySlot;
use crate::{CredentialRecord, LocauthError, Region, Result};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Observable manager state.
///
/// There is no failed state: an operation either leaves the manager as it
/// found it or moves it to [`Ready`](Self::Ready).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// No resolvable credential source yet: external mode before a resolver
    /// has been supplied.
    Uninitialized,
    /// A credential source is in place for the given mode. Federated
    /// credentials may still have to be generated on first use.
    Ready(CredentialMode),
    /// An identity exchange is in flight.
    Refreshing,
}

/// Mode-specific credential state.
enum ModeState {
    Federated {
        identity_pool_id: String,
        cache: SecureCredentialCache,
        active: Option<CredentialRecord>,
    },
    External {
        resolver: Option<Arc<dyn CredentialResolver>>,
        last: Option<CredentialRecord>,
    },
}

impl ModeState {
    fn mode(&self) -> CredentialMode {
        match self {
            Self::Federated { .. } => CredentialMode::Federated,
            Self::External { .. } => CredentialMode::External,
        }
    }

    fn record(&self) -> Option<&CredentialRecord> {
        match self {
            Self::Federated { active, .. } => active.as_ref(),
            Self::External { last, .. } => last.as_ref(),
        }
    }

    /// Source handed to a newly built service client.
    fn credential_source(&self) -> Result<Arc<dyn CredentialSource>> {
        match self {
            Self::Federated {
                cache,
                active: Some(_),
                ..
            } => Ok(Arc::new(CachedCredentialSource::new(cache.clone()))),
            Self::External {
                resolver: Some(resolver),
                last: Some(_),
            } => Ok(Arc::new(ResolverCredentialSource::new(resolver.clone()))),
            _ => Err(LocauthError::CredentialsUnavailable),
        }
    }
}

/// Marks the manager as refreshing until dropped, even if the refreshing
/// future is abandoned mid-flight.
struct RefreshGuard(Arc<AtomicBool>);

impl RefreshGuard {
    fn enter(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag.clone())
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Reports whether an identity exchange is in flight.
///
/// The monitor is detached from the manager borrow, so it can be polled
/// while the manager (or the lock around a shared one) is held by the
/// refreshing task.
#[derive(Debug, Clone)]
pub struct RefreshMonitor(Arc<AtomicBool>);

impl RefreshMonitor {
    pub fn is_refreshing(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Coordinates credential sources, the secure cache and the service client.
pub struct CredentialLifecycleManager {
    config_store: ConfigStore,
    region: Region,
    mode: ModeState,
    refreshing: Arc<AtomicBool>,
    identity_factory: Option<Arc<dyn IdentityExchangeFactory>>,
    identity_client: LazySlot<Arc<dyn IdentityExchangeClient>>,
    client_factory: Arc<dyn ServiceClientFactory>,
    service_client: LazySlot<Arc<dyn ServiceClient>>,
}

impl CredentialLifecycleManager {
    fn with_mode(
        config_store: ConfigStore,
        region: Region,
        mode: ModeState,
        identity_factory: Option<Arc<dyn IdentityExchangeFactory>>,
        client_factory: Arc<dyn ServiceClientFactory>,
    ) -> Self {
        Self {
            config_store,
            region,
            mode,
            refreshing: Arc::new(AtomicBool::new(false)),
            identity_factory,
            identity_client: LazySlot::new(),
            client_factory,
            service_client: LazySlot::new(),
        }
    }

    /// Fresh federated construction: persists the configuration and discards
    /// any credentials cached by an earlier provider. Resolves nothing.
    pub(crate) async fn fresh_federated(
        config: ProviderConfig,
        config_store: ConfigStore,
        cache: SecureCredentialCache,
        identity_factory: Arc<dyn IdentityExchangeFactory>,
        client_factory: Arc<dyn ServiceClientFactory>,
    ) -> Result<Self> {
        let identity_pool_id = config
            .identity_pool_id()
            .ok_or(LocauthError::NoCredentialsFound)?
            .to_string();
        config_store.write(&config).await?;
        cache.clear().await?;
        info!(region = %config.region(), "federated credential provider configured");

        Ok(Self::with_mode(
            config_store,
            config.region(),
            ModeState::Federated {
                identity_pool_id,
                cache,
                active: None,
            },
            Some(identity_factory),
            client_factory,
        ))
    }

    /// Fresh external construction: persists the configuration, discards
    /// any federated credentials left in the store and, if a resolver is
    /// given, resolves it immediately.
    pub(crate) async fn fresh_external(
        config: ProviderConfig,
        config_store: ConfigStore,
        cache: SecureCredentialCache,
        resolver: Option<Arc<dyn CredentialResolver>>,
        client_factory: Arc<dyn ServiceClientFactory>,
    ) -> Result<Self> {
        config_store.write(&config).await?;
        cache.clear().await?;
        info!(region = %config.region(), "external credential provider configured");

        let mut manager = Self::with_mode(
            config_store,
            config.region(),
            ModeState::External {
                resolver: None,
                last: None,
            },
            None,
            client_factory,
        );

        if let Some(resolver) = resolver {
            manager.set_credential_resolver(resolver).await?;
        }
        Ok(manager)
    }

    /// Restores from persisted configuration.
    ///
    /// A missing credential cache is tolerated in federated mode; it is
    /// regenerated on the next [`verify_and_refresh_credentials`](Self::verify_and_refresh_credentials).
    pub(crate) async fn restore(
        config_store: ConfigStore,
        cache: SecureCredentialCache,
        identity_factory: Option<Arc<dyn IdentityExchangeFactory>>,
        client_factory: Arc<dyn ServiceClientFactory>,
    ) -> Result<Self> {
        let config = config_store.read().await?;

        let mode = match config.mode() {
            CredentialMode::Federated => {
                let identity_pool_id = config
                    .identity_pool_id()
                    .ok_or(LocauthError::NoCredentialsFound)?
                    .to_string();
                let active = cache.load().await;
                debug!(cached = active.is_some(), "restored federated provider");
                ModeState::Federated {
                    identity_pool_id,
                    cache,
                    active,
                }
            }
            CredentialMode::External => {
                debug!("restored external provider, awaiting resolver");
                ModeState::External {
                    resolver: None,
                    last: None,
                }
            }
        };

        Ok(Self::with_mode(
            config_store,
            config.region(),
            mode,
            identity_factory,
            client_factory,
        ))
    }

    /// Active credential mode.
    pub fn mode(&self) -> CredentialMode {
        self.mode.mode()
    }

    /// Region used for the identity exchange and the service client.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Returns a monitor that reports in-flight exchanges without borrowing
    /// the manager.
    pub fn refresh_monitor(&self) -> RefreshMonitor {
        RefreshMonitor(self.refreshing.clone())
    }

    pub fn state(&self) -> ManagerState {
        if self.refreshing.load(Ordering::SeqCst) {
            return ManagerState::Refreshing;
        }
        match &self.mode {
            ModeState::Federated { .. } => ManagerState::Ready(CredentialMode::Federated),
            ModeState::External {
                resolver: Some(_), ..
            } => ManagerState::Ready(CredentialMode::External),
            ModeState::External { resolver: None, .. } => ManagerState::Uninitialized,
        }
    }

    /// Returns the active credentials.
    ///
    /// # Errors
    ///
    /// [`LocauthError::CredentialsUnavailable`] if none have been resolved.
    pub fn credentials(&self) -> Result<CredentialRecord> {
        self.mode
            .record()
            .cloned()
            .ok_or(LocauthError::CredentialsUnavailable)
    }

    /// Ensures the federated cache holds unexpired credentials.
    ///
    /// Reads the persisted configuration, restores the cache, and runs the
    /// identity exchange exactly once if the cache is missing, incomplete or
    /// expired. Valid cached credentials make this a no-op.
    ///
    /// # Errors
    ///
    /// - [`LocauthError::NoCredentialsFound`]: no federated configuration persisted
    /// - [`LocauthError::CredentialGenerationFailed`]: the exchange failed
    pub async fn verify_and_refresh_credentials(&mut self) -> Result<()> {
        let config = self.config_store.read().await?;
        let identity_pool_id = config
            .identity_pool_id()
            .ok_or(LocauthError::NoCredentialsFound)?
            .to_string();

        let ModeState::Federated { cache, active, .. } = &mut self.mode else {
            return Err(LocauthError::NoCredentialsFound);
        };

        match cache.load().await {
            None => {
                debug!("credential cache missing, generating");
            }
            Some(record) => {
                let valid = record.is_valid();
                *active = Some(record);
                if valid {
                    debug!("cached credentials valid");
                    return Ok(());
                }
                debug!("cached credentials expired, generating");
            }
        }

        self.generate_credentials(config.region(), &identity_pool_id)
            .await
    }

    /// Runs the two-step identity exchange and persists the result.
    ///
    /// Every failure after the client is built surfaces as
    /// [`LocauthError::CredentialGenerationFailed`]; the cause is logged and
    /// dropped, so callers cannot tell an unknown pool from a network error.
    async fn generate_credentials(&mut self, region: Region, identity_pool_id: &str) -> Result<()> {
        let client = self.identity_client(region).await?;
        let _refreshing = RefreshGuard::enter(&self.refreshing);

        let ModeState::Federated { cache, active, .. } = &mut self.mode else {
            return Err(LocauthError::UnsupportedOperation(
                "credential generation requires federated mode".to_string(),
            ));
        };

        match exchange_and_persist(client.as_ref(), cache, identity_pool_id).await {
            Ok(record) => {
                info!(
                    %region,
                    expires_at = ?record.expires_at(),
                    "generated federated credentials"
                );
                *active = Some(record);
                self.service_client.invalidate();
                Ok(())
            }
            Err(e) => {
                warn!(%region, error = %e, "credential generation failed");
                Err(LocauthError::CredentialGenerationFailed)
            }
        }
    }

    /// Returns the identity exchange client, building it for `region` on first use.
    async fn identity_client(&mut self, region: Region) -> Result<Arc<dyn IdentityExchangeClient>> {
        if let Some(client) = self.identity_client.get() {
            return Ok(client);
        }

        let factory = self.identity_factory.as_ref().ok_or_else(|| {
            LocauthError::UnsupportedOperation(
                "no identity exchange factory configured".to_string(),
            )
        })?;
        let client = factory.build(region).await?;
        debug!(%region, "built identity exchange client");
        self.identity_client.set(client.clone());
        Ok(client)
    }

    /// Returns true iff the active credentials expire after now.
    ///
    /// # Errors
    ///
    /// [`LocauthError::CredentialsUnavailable`] if no federated cache has been
    /// restored and no external credentials have been resolved.
    pub fn is_credentials_valid(&self) -> Result<bool> {
        self.is_credentials_valid_at(Utc::now())
    }

    /// Same as [`is_credentials_valid`](Self::is_credentials_valid) at a given instant.
    pub fn is_credentials_valid_at(&self, now: DateTime<Utc>) -> Result<bool> {
        let record = self
            .mode
            .record()
            .ok_or(LocauthError::CredentialsUnavailable)?;
        Ok(record.is_valid_at(now))
    }

    /// Returns the service client, building it if absent or invalidated.
    ///
    /// The client receives a credential source that is consulted at call time.
    ///
    /// # Errors
    ///
    /// [`LocauthError::CredentialsUnavailable`] if no credentials have been resolved.
    pub fn get_service_client(&mut self) -> Result<Arc<dyn ServiceClient>> {
        let region = self.region;
        let mode = &self.mode;
        let factory = &self.client_factory;

        self.service_client.get_or_try_init(|| {
            let source = mode.credential_source()?;
            debug!(%region, "building service client");
            factory.build(region, source)
        })
    }

    /// Supplies the external credential resolver.
    ///
    /// The resolver is invoked immediately; its credentials become active and
    /// a service client is built for them.
    ///
    /// # Errors
    ///
    /// - [`LocauthError::UnsupportedOperation`]: the manager is in federated mode
    /// - [`LocauthError::CredentialsUnavailable`]: the resolver returned
    ///   credentials without a session token or expiration
    pub async fn set_credential_resolver(
        &mut self,
        resolver: Arc<dyn CredentialResolver>,
    ) -> Result<()> {
        let ModeState::External {
            resolver: held,
            last,
        } = &mut self.mode
        else {
            return Err(LocauthError::UnsupportedOperation(
                "credential resolvers are only supported in external mode".to_string(),
            ));
        };

        let record = resolver
            .resolve()
            .await?
            .into_record()
            .ok_or(LocauthError::CredentialsUnavailable)?;

        let client = self.client_factory.build(
            self.region,
            Arc::new(ResolverCredentialSource::new(resolver.clone())),
        )?;

        *held = Some(resolver);
        *last = Some(record);
        self.service_client.set(client);
        debug!(region = %self.region, "applied external credentials");
        Ok(())
    }

    /// Refreshes the active credentials.
    ///
    /// - External mode re-invokes the resolver and re-applies its result.
    /// - Federated mode clears the cache and regenerates.
    ///
    /// # Errors
    ///
    /// - [`LocauthError::UnsupportedOperation`]: external mode without a resolver
    /// - any error from [`verify_and_refresh_credentials`](Self::verify_and_refresh_credentials)
    pub async fn refresh(&mut self) -> Result<()> {
        match &mut self.mode {
            ModeState::External { resolver, .. } => {
                let resolver = resolver.clone().ok_or_else(|| {
                    LocauthError::UnsupportedOperation(
                        "refresh requires a credential resolver; call set_credential_resolver first"
                            .to_string(),
                    )
                })?;
                self.set_credential_resolver(resolver).await
            }
            ModeState::Federated { cache, active, .. } => {
                cache.clear().await?;
                *active = None;
                self.service_client.invalidate();
                info!("cleared federated credentials for refresh");
                self.verify_and_refresh_credentials().await
            }
        }
    }

    /// Erases the federated credential cache.
    ///
    /// # Errors
    ///
    /// [`LocauthError::UnsupportedOperation`] in external mode.
    pub async fn clear(&mut self) -> Result<()> {
        let ModeState::Federated { cache, active, .. } = &mut self.mode else {
            return Err(LocauthError::UnsupportedOperation(
                "clear is only supported for federated credentials".to_string(),
            ));
        };

        cache.clear().await?;
        *active = None;
        self.service_client.invalidate();
        info!("cleared federated credentials");
        Ok(())
    }

    /// Identity pool the manager exchanges against, if federated.
    pub fn identity_pool_id(&self) -> Option<&str> {
        match &self.mode {
            ModeState::Federated {
                identity_pool_id, ..
            } => Some(identity_pool_id),
            ModeState::External { .. } => None,
        }
    }
}

/// Steps 2 to 4 of credential generation. Errors are returned with their
/// cause so the caller can log it before collapsing them.
async fn exchange_and_persist(
    client: &dyn IdentityExchangeClient,
    cache: &SecureCredentialCache,
    identity_pool_id: &str,
) -> Result<CredentialRecord> {
    let identity_id = client
        .resolve_identity(identity_pool_id)
        .await?
        .filter(|id| !id.is_empty())
        .ok_or_else(|| LocauthError::IdentityResolutionFailed(identity_pool_id.to_string()))?;

    let record = client
        .exchange_for_credentials(&identity_id)
        .await?
        .into_record()
        .ok_or(LocauthError::CredentialGenerationFailed)?;

    cache.save(&record).await?;
    Ok(record)
}
