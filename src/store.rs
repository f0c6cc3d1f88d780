//! Secure key-value store trait.
//!
//! This module defines the [`SecureStore`] trait the credential cache and the
//! provider configuration persist through. Implementations own durability and
//! encryption at rest; callers only see string keys and string values.

use crate::Result;
use async_trait::async_trait;

/// SecureStore is a persistent string key-value store.
///
/// All implementations must be `Send + Sync` so one store can back both the
/// configuration and the credential cache across async tasks.
///
/// # Implementations
///
/// - [`MemoryStore`](crate::stores::memory::MemoryStore): in-memory with error injection
/// - [`FileStore`](crate::stores::file::FileStore): JSON file with owner-only permissions
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Returns the store name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// Writes a value, replacing any previous value for `key`.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Writes several values.
    ///
    /// Implementations that can make the batch a single write should override
    /// this so a concurrent reader never observes part of the batch.
    async fn put_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.put(key, value).await?;
        }
        Ok(())
    }

    /// Reads a value.
    ///
    /// A key that was never written yields `Ok(None)`, never an error.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Removes a value. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Removes every value in the store.
    async fn clear(&self) -> Result<()>;
}
