//! Locauth - credential lifecycle for location service clients.
//!
//! Locauth acquires short-lived access credentials through a federated
//! identity exchange, or accepts them from a caller-supplied resolver,
//! persists them in a secure store across restarts, checks their expiration
//! before use, and rebuilds the downstream service client whenever they
//! rotate.
//!
//! # Features
//!
//! - **Two sources**: federated identity exchange or an external resolver,
//!   fixed per provider and persisted
//! - **Async/Await**: Built on tokio for non-blocking I/O
//! - **Refresh on demand**: validity is checked lazily, no timers
//! - **All-or-nothing cache**: a partially written cache reads as absent
//! - **Pull-based clients**: service clients consult the cache at call time
//!
//! # Quick Start
//!
//! ```no_run
//! use locauth::factory::{new_manager, Collaborators, ProviderSource};
//! use locauth::stores::file::FileStore;
//! use locauth::{IdentityExchangeFactory, Region, ServiceClient, ServiceClientFactory};
//! use std::sync::Arc;
//!
//! async fn run(
//!     clients: Arc<dyn ServiceClientFactory>,
//!     exchange: Arc<dyn IdentityExchangeFactory>,
//! ) -> locauth::Result<()> {
//!     let store = Arc::new(FileStore::new("/tmp/locauth/store.json").await?);
//!     let collaborators = Collaborators::new(store, clients).with_identity_exchange(exchange);
//!
//!     // First run: configure federated mode
//!     let mut manager = new_manager(
//!         ProviderSource::federated("us-east-1:pool-id", Region::UsEast1),
//!         collaborators.clone(),
//!     )
//!     .await?;
//!     manager.verify_and_refresh_credentials().await?;
//!
//!     // Later runs: restore the persisted configuration and cache
//!     let mut manager = new_manager(ProviderSource::Restore, collaborators).await?;
//!     manager.verify_and_refresh_credentials().await?;
//!     let client = manager.get_service_client()?;
//!     println!("client for {}", client.region());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! | Feature | Adds |
//! |---------|------|
//! | `cognito` | [`cognito::CognitoExchangeFactory`], an AWS SDK backed identity exchange |

pub mod cache;
pub mod client;
#[cfg(feature = "cognito")]
pub mod cognito;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod identity;
pub mod manager;
pub mod region;
pub mod resolver;
pub mod slot;
pub mod store;
pub mod stores;
pub mod validation;

pub use cache::SecureCredentialCache;
pub use client::{CredentialSource, ServiceClient, ServiceClientFactory};
pub use config::{ConfigStore, CredentialMode, ProviderConfig};
pub use credentials::{CredentialRecord, ResolvedCredentials};
pub use error::{LocauthError, Result};
pub use factory::{new_manager, Collaborators, ProviderSource, SharedManager};
pub use identity::{ExchangedCredentials, IdentityExchangeClient, IdentityExchangeFactory};
pub use manager::{CredentialLifecycleManager, ManagerState, RefreshMonitor};
pub use region::Region;
pub use resolver::CredentialResolver;
pub use store::SecureStore;
