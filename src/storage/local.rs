//! Local filesystem blob store.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── notification.json
//! └── client_id.json
//! ```
//!
//! Writes go to a temp file first and are renamed into place.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::BlobStore;

/// Directory-rooted blob store.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root_dir: PathBuf,
}

impl LocalBlobStore {
    /// Create a LocalBlobStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a blob name.
    fn path(&self, name: &str) -> PathBuf {
        self.root_dir.join(name)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn read_json(&self, name: &str) -> Result<Option<Value>> {
        match self.read_bytes(name).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn write_json(&self, name: &str, value: &Value, allow_overwrite: bool) -> Result<()> {
        if !allow_overwrite && tokio::fs::try_exists(self.path(name)).await? {
            return Err(AppError::BlobExists(name.to_string()));
        }
        let bytes = serde_json::to_vec(value)?;
        self.write_bytes(name, &bytes).await
    }

    async fn remove(&self, name: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(tmp.path());

        let value = serde_json::json!({ "subscription": ["教务处"] });
        store.write_json("cfg.json", &value, false).await.unwrap();
        assert_eq!(store.read_json("cfg.json").await.unwrap(), Some(value));
        assert!(!tmp.path().join("cfg.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_temp_file_does_not_clobber_siblings() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("cfg.tmp"), b"keep").unwrap();
        let store = LocalBlobStore::new(tmp.path());

        store.write_json("cfg.json", &serde_json::json!(1), false).await.unwrap();
        store.write_json("cfg.toml", &serde_json::json!(2), false).await.unwrap();

        assert_eq!(std::fs::read(tmp.path().join("cfg.tmp")).unwrap(), b"keep");
        assert_eq!(store.read_json("cfg.json").await.unwrap(), Some(serde_json::json!(1)));
        assert_eq!(store.read_json("cfg.toml").await.unwrap(), Some(serde_json::json!(2)));
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(tmp.path());
        assert!(store.read_json("nope.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_guard() {
        let tmp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(tmp.path().join("nested"));

        store.write_json("a.json", &serde_json::json!(1), false).await.unwrap();
        assert!(matches!(
            store.write_json("a.json", &serde_json::json!(2), false).await,
            Err(AppError::BlobExists(_))
        ));
        store.write_json("a.json", &serde_json::json!(2), true).await.unwrap();
        assert_eq!(store.read_json("a.json").await.unwrap(), Some(serde_json::json!(2)));
    }

    #[tokio::test]
    async fn test_malformed_json_is_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bad.json"), b"{not json").unwrap();
        let store = LocalBlobStore::new(tmp.path());
        assert!(matches!(
            store.read_json("bad.json").await,
            Err(AppError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_missing_is_ok() {
        let tmp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(tmp.path());
        store.remove("missing.json").await.unwrap();
    }
}
