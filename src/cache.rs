//! Credential cache persisted through a [`SecureStore`].
//!
//! A [`CredentialRecord`] is stored field by field under the keys in
//! [`CREDENTIAL_KEYS`](crate::constants::CREDENTIAL_KEYS). Reads are
//! all-or-nothing: if any field is missing, empty or unparsable, the cache
//! reports no record at all.

use crate::constants::{ACCESS_KEY_ID, CREDENTIAL_KEYS, EXPIRATION, SECRET_KEY, SESSION_TOKEN};
use crate::store::SecureStore;
use crate::{CredentialRecord, LocauthError, Result};
use std::sync::Arc;
use tracing::debug;

/// Persists and restores a single [`CredentialRecord`].
///
/// Clones share the same backing store.
#[derive(Clone, Default)]
pub struct SecureCredentialCache {
    store: Option<Arc<dyn SecureStore>>,
}

impl SecureCredentialCache {
    /// Creates a cache backed by `store`.
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Creates a cache with no backing store.
    ///
    /// Saves fail with [`LocauthError::NotInitialized`]; loads report no record.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    /// Returns true if a backing store is attached.
    pub fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    /// Writes all four fields in one batch.
    ///
    /// # Errors
    ///
    /// - [`LocauthError::NotInitialized`]: no backing store
    /// - [`LocauthError::CredentialsUnavailable`]: the record is incomplete
    /// - any error from the store
    pub async fn save(&self, record: &CredentialRecord) -> Result<()> {
        let store = self.store.as_ref().ok_or(LocauthError::NotInitialized)?;

        if !record.is_complete() {
            return Err(LocauthError::CredentialsUnavailable);
        }

        let expiration = record.expiration.to_string();
        store
            .put_all(&[
                (ACCESS_KEY_ID, record.access_key_id.as_str()),
                (SECRET_KEY, record.secret_key.as_str()),
                (SESSION_TOKEN, record.session_token.as_str()),
                (EXPIRATION, expiration.as_str()),
            ])
            .await?;

        debug!(store = store.name(), expiration = record.expiration, "credentials cached");
        Ok(())
    }

    /// Reads the cached record.
    ///
    /// Returns `None` when the cache is uninitialized, when any field is
    /// missing or empty, when the expiration does not parse, or when the
    /// store itself fails to read. Absence means "regenerate", never an error.
    pub async fn load(&self) -> Option<CredentialRecord> {
        let store = self.store.as_ref()?;

        let mut fields = Vec::with_capacity(CREDENTIAL_KEYS.len());
        for key in CREDENTIAL_KEYS {
            match store.get(key).await {
                Ok(Some(value)) if !value.is_empty() => fields.push(value),
                Ok(_) => {
                    debug!(key, "credential cache incomplete");
                    return None;
                }
                Err(e) => {
                    debug!(key, error = %e, "credential cache unreadable");
                    return None;
                }
            }
        }

        let expiration = fields[3].parse::<f64>().ok()?;
        CredentialRecord::new(
            fields[0].clone(),
            fields[1].clone(),
            fields[2].clone(),
            expiration,
        )
    }

    /// Removes every cached field. Idempotent.
    ///
    /// Only the credential keys are removed; other values in the same store
    /// (such as the provider configuration) are left untouched.
    pub async fn clear(&self) -> Result<()> {
        let Some(store) = self.store.as_ref() else {
            return Ok(());
        };

        for key in CREDENTIAL_KEYS {
            store.remove(key).await?;
        }

        debug!(store = store.name(), "credential cache cleared");
        Ok(())
    }
}
