//! # Redis Cache Store
//!
//! Redis-backed [`CacheStore`] using a multiplexed `ConnectionManager`, which
//! reconnects on its own after a dropped connection.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use super::CacheStore;
use crate::error::{PersistenceError, Result};
use crate::retry::RetryPolicy;

/// Redis cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub url: String,
    pub retry: RetryPolicy,
    /// Upper bound on the initial connect, retries included
    pub connect_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            retry: RetryPolicy::default(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Redis cache store
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
    config: CacheConfig,
}

impl RedisCacheStore {
    /// Connect to Redis, retrying transient failures per `config.retry`
    /// for at most `config.connect_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::CacheRejected`](crate::PersistenceError::CacheRejected)
    /// for an invalid URL and
    /// [`PersistenceError::CacheUnavailable`](crate::PersistenceError::CacheUnavailable)
    /// when the server stays unreachable.
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        let connect = config.retry.run("cache_connect", || {
            let client = client.clone();
            async move {
                ConnectionManager::new(client)
                    .await
                    .map_err(PersistenceError::from)
            }
        });
        let conn = tokio::time::timeout(config.connect_timeout, connect)
            .await
            .map_err(|_| {
                PersistenceError::CacheUnavailable(format!(
                    "no connection to {} within {:?}",
                    config.url, config.connect_timeout
                ))
            })??;

        Ok(Self { conn, config })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.config
            .retry
            .run("cache_get", || {
                let mut conn = self.conn.clone();
                async move {
                    conn.get::<_, Option<Vec<u8>>>(key)
                        .await
                        .map_err(PersistenceError::from)
                }
            })
            .await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        // SET EX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        self.config
            .retry
            .run("cache_set", || {
                let mut conn = self.conn.clone();
                async move {
                    conn.set_ex::<_, _, ()>(key, value, seconds)
                        .await
                        .map_err(PersistenceError::from)
                }
            })
            .await
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
