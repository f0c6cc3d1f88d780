//! In-memory store for testing.
//!
//! This store keeps all values in process memory with error injection
//! capabilities, for testing code that persists through [`SecureStore`].

use crate::store::SecureStore;
use crate::{LocauthError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory secure store.
///
/// Values do not survive the process. Clones share the same map, which lets
/// a test hand one clone to a manager and inspect the other.
///
/// # Example
///
/// ```
/// use locauth::stores::memory::MemoryStore;
/// use locauth::SecureStore;
///
/// #[tokio::main]
/// async fn main() -> locauth::Result<()> {
///     let store = MemoryStore::new();
///     store.put("region", "us-east-1").await?;
///     assert_eq!(store.get("region").await?.as_deref(), Some("us-east-1"));
///     assert_eq!(store.get("missing").await?, None);
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, String>>>,
    writes: Arc<RwLock<HashMap<String, usize>>>,
    batches: Arc<AtomicUsize>,
    put_error: Arc<RwLock<Option<String>>>,
    get_error: Arc<RwLock<Option<String>>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a value without counting it as a write.
    pub async fn seed(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().await.insert(key.into(), value.into());
    }

    /// Makes every subsequent write fail with `message`; `None` restores writes.
    pub async fn fail_puts(&self, message: Option<&str>) {
        *self.put_error.write().await = message.map(str::to_string);
    }

    /// Makes every subsequent read fail with `message`; `None` restores reads.
    pub async fn fail_gets(&self, message: Option<&str>) {
        *self.get_error.write().await = message.map(str::to_string);
    }

    /// Number of times `key` has been written.
    pub async fn write_count(&self, key: &str) -> usize {
        self.writes.read().await.get(key).copied().unwrap_or(0)
    }

    /// Number of batch writes performed.
    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    /// Number of stored values.
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    /// Returns true if the store holds no values.
    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }

    async fn check_put(&self, key: &str) -> Result<()> {
        match self.put_error.read().await.as_ref() {
            Some(message) => Err(LocauthError::store_op(
                "memory",
                "put",
                key,
                LocauthError::Other(anyhow::anyhow!("{}", message)),
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SecureStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.check_put(key).await?;

        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        *self.writes.write().await.entry(key.to_string()).or_default() += 1;
        Ok(())
    }

    async fn put_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        let first = entries.first().map(|(key, _)| *key).unwrap_or("");
        self.check_put(first).await?;

        // One lock for the whole batch.
        let mut values = self.values.write().await;
        let mut writes = self.writes.write().await;
        for (key, value) in entries {
            values.insert(key.to_string(), value.to_string());
            *writes.entry(key.to_string()).or_default() += 1;
        }
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(message) = self.get_error.read().await.as_ref() {
            return Err(LocauthError::store_op(
                "memory",
                "get",
                key,
                LocauthError::Other(anyhow::anyhow!("{}", message)),
            ));
        }

        Ok(self.values.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.values.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();
        store.put("method", "cognito").await.unwrap();

        assert_eq!(store.get("method").await.unwrap().as_deref(), Some("cognito"));
        assert_eq!(store.write_count("method").await, 1);
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("never-written").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clones_share_values() {
        let store = MemoryStore::new();
        let view = store.clone();
        store.put("region", "eu-west-1").await.unwrap();

        assert_eq!(view.get("region").await.unwrap().as_deref(), Some("eu-west-1"));
    }

    #[tokio::test]
    async fn test_batch_write() {
        let store = MemoryStore::new();
        store.put_all(&[("a", "1"), ("b", "2")]).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.batch_count(), 1);
        assert_eq!(store.write_count("b").await, 1);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let store = MemoryStore::new();
        store.seed("a", "1").await;
        store.seed("b", "2").await;

        store.remove("a").await.unwrap();
        store.remove("a").await.unwrap();
        assert_eq!(store.len().await, 1);

        store.clear().await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_error_injection() {
        let store = MemoryStore::new();
        store.fail_puts(Some("read-only")).await;

        let err = store.put("a", "1").await.unwrap_err();
        assert!(err.to_string().contains("read-only"));
        assert!(store.put_all(&[("a", "1")]).await.is_err());
        assert!(store.is_empty().await);

        store.fail_puts(None).await;
        store.fail_gets(Some("locked")).await;
        store.put("a", "1").await.unwrap();
        assert!(store.get("a").await.is_err());
    }
}
