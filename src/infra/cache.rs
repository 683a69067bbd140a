use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Process-wide cache of rendered responses, keyed by view.
///
/// Entries carry an absolute expiry; an expired entry behaves like a
/// miss and is overwritten by the next store. Lookups never fail, so a
/// miss always falls through to recomputation.
#[derive(Clone, Default)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

struct CacheEntry {
    body: Bytes,
    expires_at: Instant,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let guard = self.entries.read().await;
        let entry = guard.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.body.clone())
    }

    pub async fn put(&self, key: &str, body: Bytes, ttl: Duration) {
        let entry = CacheEntry {
            body,
            expires_at: Instant::now() + ttl,
        };
        let mut guard = self.entries.write().await;
        guard.insert(key.to_string(), entry);
    }

    pub async fn remove(&self, key: &str) {
        let mut guard = self.entries.write().await;
        guard.remove(key);
    }

    pub async fn clear(&self) {
        let mut guard = self.entries.write().await;
        guard.clear();
    }
}
