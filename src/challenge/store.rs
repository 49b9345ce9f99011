// src/challenge/store.rs

//! Client id cache used by the challenge solver.
//!
//! Persisted layout, keyed by landing URL:
//!
//! ```json
//! { "https://dean.xjtu.edu.cn/jxxx/jxtz2.htm": { "client_id": "...", "expire_time": 1735000000 } }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::BlobStore;

/// A client id and the unix time at which it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdEntry {
    pub client_id: String,
    pub expire_time: i64,
}

impl ClientIdEntry {
    /// An entry acquired now that lives for `ttl_hours`.
    pub fn acquired_now(client_id: impl Into<String>, ttl_hours: u64) -> Self {
        let ttl_secs = i64::try_from(ttl_hours.saturating_mul(3600)).unwrap_or(i64::MAX);
        Self {
            client_id: client_id.into(),
            expire_time: Utc::now().timestamp().saturating_add(ttl_secs),
        }
    }

    pub fn is_valid_at(&self, unix_secs: i64) -> bool {
        unix_secs < self.expire_time
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now().timestamp())
    }
}

/// Storage for acquired client ids. Expired entries are never returned.
#[async_trait]
pub trait ClientIdStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<ClientIdEntry>>;

    async fn put(&self, key: &str, entry: ClientIdEntry) -> Result<()>;

    /// Forget every client id.
    async fn clear(&self) -> Result<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryClientIdStore {
    entries: Mutex<HashMap<String, ClientIdEntry>>,
}

impl MemoryClientIdStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientIdStore for MemoryClientIdStore {
    async fn get(&self, key: &str) -> Result<Option<ClientIdEntry>> {
        Ok(lock(&self.entries)
            .get(key)
            .filter(|entry| entry.is_valid())
            .cloned())
    }

    async fn put(&self, key: &str, entry: ClientIdEntry) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), entry);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        lock(&self.entries).clear();
        Ok(())
    }
}

/// Store backed by a single JSON blob.
pub struct BlobClientIdStore {
    store: Arc<dyn BlobStore>,
    name: String,
}

impl BlobClientIdStore {
    pub fn new(store: Arc<dyn BlobStore>, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
        }
    }

    async fn load_map(&self) -> Result<HashMap<String, ClientIdEntry>> {
        let Some(value) = self.store.read_json(&self.name).await.unwrap_or_else(|e| {
            log::warn!("Client id cache {} unreadable: {}", self.name, e);
            None
        }) else {
            return Ok(HashMap::new());
        };
        Ok(serde_json::from_value(value).unwrap_or_else(|e| {
            log::warn!("Client id cache {} malformed, starting empty: {}", self.name, e);
            HashMap::new()
        }))
    }

    async fn save_map(&self, map: &HashMap<String, ClientIdEntry>) -> Result<()> {
        let value = serde_json::to_value(map)?;
        self.store.write_json(&self.name, &value, true).await
    }
}

#[async_trait]
impl ClientIdStore for BlobClientIdStore {
    async fn get(&self, key: &str) -> Result<Option<ClientIdEntry>> {
        let mut map = self.load_map().await?;
        Ok(map.remove(key).filter(ClientIdEntry::is_valid))
    }

    async fn put(&self, key: &str, entry: ClientIdEntry) -> Result<()> {
        let mut map = self.load_map().await?;
        map.retain(|_, e| e.is_valid());
        map.insert(key.to_string(), entry);
        self.save_map(&map).await
    }

    async fn clear(&self) -> Result<()> {
        self.save_map(&HashMap::new()).await
    }
}
