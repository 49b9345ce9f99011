//! In-memory blob store for tests and embedding.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::storage::BlobStore;

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Value>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read_json(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.blobs().get(name).cloned())
    }

    async fn write_json(&self, name: &str, value: &Value, allow_overwrite: bool) -> Result<()> {
        let mut blobs = self.blobs();
        if !allow_overwrite && blobs.contains_key(name) {
            return Err(AppError::BlobExists(name.to_string()));
        }
        blobs.insert(name.to_string(), value.clone());
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.blobs().remove(name);
        Ok(())
    }
}
