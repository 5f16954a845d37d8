use super::CacheStore;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Process-local store. Expired entries are skipped on read and pruned on every write.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).and_then(|entry| {
            if Instant::now() < entry.expires_at {
                Some(entry.value.clone())
            } else {
                None
            }
        }))
    }

    async fn set(&self, key: &str, value: Value, ttl_secs: u64) -> anyhow::Result<()> {
        let now = Instant::now();
        let expires_at = now + Duration::from_secs(ttl_secs.min(MAX_TTL_SECS));
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| now < entry.expires_at);
        entries.insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = MemoryCache::new();
        cache.set("k", json!({"a": 1}), 10).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(json!({"a": 1})));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.get("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites_existing_entry() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), 60).await.unwrap();
        cache.set("k", json!(2), 60).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(json!(2)));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_prune_expired_entries() {
        let cache = MemoryCache::new();
        for day in 0..30 {
            cache
                .set(&format!("screener:stock_quotes:day-{day}"), json!([day]), 300)
                .await
                .unwrap();
            tokio::time::advance(Duration::from_secs(24 * 3600)).await;
        }
        // Only the latest write survives until the next one.
        assert_eq!(cache.len().await, 1);

        cache.set("live", json!(1), 300).await.unwrap();
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("live").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn zero_ttl_is_immediately_absent() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), 0).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
