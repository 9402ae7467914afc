use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::cache::Cache;
use crate::error::StoreError;

/// In-process [`Cache`]. Expired entries are evicted lazily, on access.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Instant>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `key` is present and not expired.
    pub async fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .await
            .get(key)
            .map_or(false, |expires_at| *expires_at > Instant::now())
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        match entries.get(key) {
            Some(expires_at) if *expires_at > now => Ok(false),
            _ => {
                entries.insert(key.to_string(), now + ttl);
                Ok(true)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
