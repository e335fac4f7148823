use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::warn;

use crate::domain::ports::{CacheError, DistributedLease, LeaseAcquireOutcome, ResultCache};

/// Single Redis-backed adapter for both the result cache (tier 1) and the
/// distributed lease (tier 2). One connection, two key namespaces — the
/// same split the Postgres repositories make between aggregates sharing one
/// `PgPool`.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    key_prefix: String,
    lease_retries: u32,
    lease_retry_interval: Duration,
}

impl RedisStore {
    pub async fn connect(
        url: &str,
        key_prefix: String,
        lease_retries: u32,
        lease_retry_interval: Duration,
    ) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self {
            conn,
            key_prefix,
            lease_retries,
            lease_retry_interval,
        })
    }

    fn idempotency_key(&self, key: &str) -> String {
        format!("{}idempotency:{}", self.key_prefix, key)
    }

    fn lease_key(&self, key: &str) -> String {
        format!("{}lock:{}", self.key_prefix, key)
    }
}

#[async_trait]
impl ResultCache for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get(self.idempotency_key(key))
            .await
            .map_err(|e| CacheError(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(self.idempotency_key(key), value, ttl.as_secs().max(1))
            .await
            .map_err(|e| CacheError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl DistributedLease for RedisStore {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> LeaseAcquireOutcome {
        let full_key = self.lease_key(key);
        let ttl_ms = ttl.as_millis() as u64;

        for attempt in 0..self.lease_retries {
            let mut conn = self.conn.clone();
            let now = chrono::Utc::now().timestamp_millis().to_string();

            let result: redis::RedisResult<Option<String>> = redis::cmd("SET")
                .arg(&full_key)
                .arg(now)
                .arg("NX")
                .arg("PX")
                .arg(ttl_ms)
                .query_async(&mut conn)
                .await;

            match result {
                Ok(Some(_)) => return LeaseAcquireOutcome::Acquired,
                Ok(None) => {
                    if attempt + 1 < self.lease_retries {
                        tokio::time::sleep(self.lease_retry_interval).await;
                    }
                }
                Err(e) => {
                    warn!("lease acquire failed open due to cache error: {e}");
                    return LeaseAcquireOutcome::FailedOpen;
                }
            }
        }

        LeaseAcquireOutcome::HeldByOther
    }

    async fn release(&self, key: &str) {
        let mut conn = self.conn.clone();
        let full_key = self.lease_key(key);
        let result: redis::RedisResult<i64> = conn.del(full_key).await;
        if let Err(e) = result {
            warn!("best-effort lease release failed (TTL will reclaim it): {e}");
        }
    }
}
