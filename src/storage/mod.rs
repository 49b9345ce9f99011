//! Blob storage for configuration and notification snapshots.
//!
//! The core never touches the filesystem itself; it reads and writes named
//! JSON blobs through [`BlobStore`]. Two logical blobs exist:
//!
//! ```text
//! data/
//! └── notification_config.json   # subscriptions + rulesets
//! cache/
//! ├── notification.json          # last merged notification list
//! └── client_id.json             # challenge client ids
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::Notification;
use crate::services::NotificationManager;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

const SECS_PER_DAY: f64 = 86_400.0;

/// Named JSON blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a blob, `None` if it does not exist.
    async fn read_json(&self, name: &str) -> Result<Option<Value>>;

    /// Write a blob. Fails with `BlobExists` when it exists and
    /// `allow_overwrite` is false.
    async fn write_json(&self, name: &str, value: &Value, allow_overwrite: bool) -> Result<()>;

    /// Delete a blob; deleting a missing blob is not an error.
    async fn remove(&self, name: &str) -> Result<()>;

    /// Read a blob written by [`BlobStore::write_expire_json`].
    ///
    /// Blobs older than `expire_days`, and malformed ones, read as `None` and
    /// are removed.
    async fn read_expire_json(&self, name: &str, expire_days: u32) -> Result<Option<Value>> {
        let wrapped = match self.read_json(name).await {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(None),
            Err(e) => {
                log::warn!("Expiring blob {} unreadable: {}", name, e);
                self.remove(name).await?;
                return Ok(None);
            }
        };

        let timestamp = wrapped.get("timestamp").and_then(Value::as_f64);
        let now = Utc::now().timestamp_millis() as f64 / 1000.0;
        match (timestamp, wrapped.get("data")) {
            (Some(ts), Some(data)) if ts + f64::from(expire_days) * SECS_PER_DAY > now => {
                Ok(Some(data.clone()))
            }
            _ => {
                self.remove(name).await?;
                Ok(None)
            }
        }
    }

    /// Write a blob stamped with the current time.
    async fn write_expire_json(
        &self,
        name: &str,
        value: &Value,
        allow_overwrite: bool,
    ) -> Result<()> {
        let wrapped = serde_json::json!({
            "timestamp": Utc::now().timestamp_millis() as f64 / 1000.0,
            "data": value,
        });
        self.write_json(name, &wrapped, allow_overwrite).await
    }
}

/// Load the manager, falling back to an empty one on any error.
pub async fn load_manager(store: &dyn BlobStore, name: &str) -> NotificationManager {
    let loaded = match store.read_json(name).await {
        Ok(value) => NotificationManager::load_or_create(value.as_ref()),
        Err(e) => Err(e),
    };
    loaded.unwrap_or_else(|e| {
        log::warn!("Subscription config {} unusable: {}. Starting empty.", name, e);
        NotificationManager::new()
    })
}

pub async fn save_manager(
    store: &dyn BlobStore,
    name: &str,
    manager: &NotificationManager,
) -> Result<()> {
    store.write_json(name, &manager.dump_config(), true).await
}

/// Load the notification cache.
///
/// A missing or corrupt cache reads as an empty list; an unknown source
/// propagates.
pub async fn load_notifications(store: &dyn BlobStore, name: &str) -> Result<Vec<Notification>> {
    let value = match store.read_json(name).await {
        Ok(Some(value)) => value,
        Ok(None) => return Ok(Vec::new()),
        Err(AppError::Json(e)) => {
            log::warn!("Notification cache {} is not JSON: {}", name, e);
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    match Notification::load_all(&value) {
        Ok(list) => Ok(list),
        Err(AppError::CorruptCache(message)) => {
            log::warn!("Notification cache {} corrupt: {}", name, message);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

pub async fn save_notifications(
    store: &dyn BlobStore,
    name: &str,
    notifications: &[Notification],
) -> Result<()> {
    store
        .write_json(name, &Notification::dump_all(notifications), true)
        .await
}
