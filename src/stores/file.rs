//! File-backed secure store.
//!
//! Values are persisted as a single versioned JSON document so they survive
//! process restarts. The file is rewritten whole on every mutation.

use crate::constants::STORE_NAMESPACE;
use crate::store::SecureStore;
use crate::{LocauthError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// On-disk format version.
const DOCUMENT_VERSION: u32 = 1;

/// Store file contents.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    values: BTreeMap<String, String>,
}

/// File-backed secure store.
///
/// # Security
///
/// - The store file is created with mode 0600 (owner read/write only) on Unix
/// - Parent directories are created with mode 0700 (owner access only)
/// - A corrupt or unknown-version store file is deleted and treated as empty
/// - Values are never logged or exposed in errors
///
/// Encryption at rest is not provided here; applications that need it supply
/// a platform keystore through [`SecureStore`] instead.
///
/// # Example
///
/// ```no_run
/// use locauth::stores::file::FileStore;
/// use locauth::SecureStore;
///
/// #[tokio::main]
/// async fn main() -> locauth::Result<()> {
///     let store = FileStore::new("/tmp/locauth/credentials.json").await?;
///     store.put("region", "us-east-1").await?;
///     Ok(())
/// }
/// ```
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process.
    lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store backed by `path`.
    ///
    /// The parent directory is created with restricted permissions (0700 on Unix).
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mut perms = fs::metadata(parent).await?.permissions();
                perms.set_mode(0o700);
                fs::set_permissions(parent, perms).await?;
            }
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Creates a store under `dir` using the default file name.
    pub async fn in_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(dir.as_ref().join(format!("{}.json", STORE_NAMESPACE))).await
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>> {
        let data = match fs::read(&self.path).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(LocauthError::store_op("file", "read", "", e.into())),
        };

        match serde_json::from_slice::<StoreDocument>(&data) {
            Ok(document) if document.version == DOCUMENT_VERSION => Ok(document.values),
            Ok(document) => {
                warn!(
                    path = %self.path.display(),
                    version = document.version,
                    "discarding store file with unknown version"
                );
                self.discard().await;
                Ok(BTreeMap::new())
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding corrupt store file");
                self.discard().await;
                Ok(BTreeMap::new())
            }
        }
    }

    async fn discard(&self) {
        if let Err(e) = fs::remove_file(&self.path).await {
            debug!(path = %self.path.display(), error = %e, "failed to remove store file");
        }
    }

    async fn write_map(&self, values: BTreeMap<String, String>) -> Result<()> {
        let document = StoreDocument {
            version: DOCUMENT_VERSION,
            values,
        };
        let json = serde_json::to_vec_pretty(&document)?;
        let tmp = self.path.with_extension("tmp");

        let mut file = fs::File::create(&tmp).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = file.metadata().await?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&tmp, perms).await?;
        }

        file.write_all(&json).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn update<F>(&self, operation: &str, key: &str, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) + Send,
    {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        mutate(&mut map);
        self.write_map(map)
            .await
            .map_err(|e| LocauthError::store_op("file", operation, key, e))
    }
}

#[async_trait]
impl SecureStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.update("put", key, |map| {
            map.insert(key.to_string(), value.to_string());
        })
        .await
    }

    async fn put_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        self.update("put", "", |map| {
            for (key, value) in entries {
                map.insert(key.to_string(), value.to_string());
            }
        })
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await?.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.update("remove", key, |map| {
            map.remove(key);
        })
        .await
    }

    /// This is idempotent - clearing an empty or missing store is not an error.
    async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        match fs::remove_file(&self.path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LocauthError::store_op("file", "clear", "", e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::new(&path).await.unwrap();
        store.put("region", "us-east-1").await.unwrap();
        drop(store);

        let reopened = FileStore::new(&path).await.unwrap();
        assert_eq!(
            reopened.get("region").await.unwrap().as_deref(),
            Some("us-east-1")
        );
    }

    #[tokio::test]
    async fn test_in_dir_uses_namespace() {
        let dir = tempdir().unwrap();
        let store = FileStore::in_dir(dir.path()).await.unwrap();

        assert_eq!(
            store.path(),
            dir.path().join("software.amazon.location.auth.json")
        );
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested/store.json"))
            .await
            .unwrap();

        assert_eq!(store.get("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_all_and_remove() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("store.json")).await.unwrap();

        store
            .put_all(&[("accessKeyId", "A"), ("secretKey", "S")])
            .await
            .unwrap();
        store.remove("accessKeyId").await.unwrap();
        store.remove("accessKeyId").await.unwrap();

        assert_eq!(store.get("accessKeyId").await.unwrap(), None);
        assert_eq!(store.get("secretKey").await.unwrap().as_deref(), Some("S"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileStore::new(&path).await.unwrap();
        assert_eq!(store.get("region").await.unwrap(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_document_is_versioned() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::new(&path).await.unwrap();
        store.put("region", "us-east-1").await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["values"]["region"], "us-east-1");
    }

    #[tokio::test]
    async fn test_unknown_version_is_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, br#"{"version": 9, "values": {"region": "us-east-1"}}"#).unwrap();

        let store = FileStore::new(&path).await.unwrap();
        assert_eq!(store.get("region").await.unwrap(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("store.json")).await.unwrap();

        store.put("method", "custom").await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.get("method").await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::new(&path).await.unwrap();
        store.put("secretKey", "S").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
