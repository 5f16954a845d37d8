use crate::cache::CacheStore;
use crate::config::Settings;
use anyhow::Context;
use chrono::{Duration, Utc};
use serde_json::Value;

// Ten years; keeps `now() + ttl` far from chrono's range limits.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

/// Postgres-backed cache store (`cache_entries` table).
#[derive(Debug, Clone)]
pub struct PgCache {
    pool: sqlx::PgPool,
}

impl PgCache {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(settings: &Settings) -> anyhow::Result<Self> {
        let db_url = settings.require_database_url()?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
            .context("connect DATABASE_URL failed")?;

        super::migrate(&pool).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait::async_trait]
impl CacheStore for PgCache {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let row: Option<(Value,)> = sqlx::query_as(
            "SELECT value FROM cache_entries WHERE key = $1 AND expires_at > now()",
        )
        .persistent(false)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("select cache_entries failed (key={key})"))?;

        Ok(row.map(|(v,)| v))
    }

    async fn set(&self, key: &str, value: Value, ttl_secs: u64) -> anyhow::Result<()> {
        let ttl = ttl_secs.min(MAX_TTL_SECS) as i64;
        let expires_at = Utc::now() + Duration::seconds(ttl);

        sqlx::query(
            "INSERT INTO cache_entries (key, value, written_at, expires_at) \
             VALUES ($1, $2, now(), $3) \
             ON CONFLICT (key) DO UPDATE \
               SET value = EXCLUDED.value, written_at = EXCLUDED.written_at, expires_at = EXCLUDED.expires_at",
        )
        .persistent(false)
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("upsert cache_entries failed (key={key})"))?;

        Ok(())
    }
}
