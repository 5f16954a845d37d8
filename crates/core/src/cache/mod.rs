//! Optional keyed store with per-entry TTL.
//!
//! Screeners cache their per-day datasets here and the engine caches whole
//! recommendation bundles. Every backend honours the same contract: `set` overwrites,
//! `get` returns `None` once the TTL has lapsed, and values are handed out as copies.

pub mod memory;

use crate::config::Settings;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub use memory::MemoryCache;

#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value, ttl_secs: u64) -> anyhow::Result<()>;
}

/// Front door used by the pipeline. A facade without a store turns every call into a
/// no-op; backend errors are logged and read as misses.
#[derive(Clone, Default)]
pub struct CacheFacade {
    store: Option<Arc<dyn CacheStore>>,
}

impl std::fmt::Debug for CacheFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheFacade")
            .field("backend", &self.store.as_ref().map(|s| s.backend_name()))
            .finish()
    }
}

impl CacheFacade {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    /// Picks a backend from `CACHE_BACKEND` (`memory`, `postgres`, `none`). When unset,
    /// Postgres is used if `DATABASE_URL` is configured, memory otherwise. A Postgres
    /// backend that cannot be reached degrades to memory.
    pub async fn from_settings(settings: &Settings) -> Self {
        let backend = settings
            .cache_backend
            .clone()
            .unwrap_or_else(|| match settings.database_url {
                Some(_) => "postgres".to_string(),
                None => "memory".to_string(),
            });

        match backend.as_str() {
            "none" => Self::disabled(),
            "postgres" => match crate::storage::cache_entries::PgCache::connect(settings).await {
                Ok(pg) => Self::new(Arc::new(pg)),
                Err(e) => {
                    tracing::error!(error = %e, "postgres cache unavailable; falling back to memory cache");
                    Self::memory()
                }
            },
            "memory" => Self::memory(),
            other => {
                tracing::warn!(backend = other, "unknown CACHE_BACKEND; using memory cache");
                Self::memory()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_ref()?;
        let value = match store.get(key).await {
            Ok(v) => v?,
            Err(e) => {
                tracing::warn!(key, backend = store.backend_name(), error = %e, "cache read failed");
                return None;
            }
        };

        match serde_json::from_value::<T>(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(key, error = %e, "cached value has unexpected shape; ignoring");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let Some(store) = self.store.as_ref() else {
            return;
        };

        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "value not serializable; skipping cache write");
                return;
            }
        };

        if let Err(e) = store.set(key, value, ttl_secs).await {
            tracing::warn!(key, backend = store.backend_name(), error = %e, "cache write failed");
        }
    }
}
