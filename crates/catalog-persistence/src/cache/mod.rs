//! # Cache Module
//!
//! Key-value store abstraction used by the read services, with a Redis
//! implementation for deployments and a moka-backed one for tests and local
//! runs. Values are opaque bytes; the services decide the encoding.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_client;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::MemoryCacheStore;
#[cfg(feature = "redis")]
pub use redis_client::{CacheConfig, RedisCacheStore};

/// Expiry applied to every cached entity or entity list
pub const ENTITY_CACHE_TTL: Duration = Duration::from_secs(300);

/// Cache TTL configuration
#[derive(Debug, Clone, Copy)]
pub struct CacheTtl {
    /// Entries holding at least one entity
    pub entity: Duration,
    /// Entries holding an empty result list
    pub empty_result: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            entity: ENTITY_CACHE_TTL,
            empty_result: Duration::from_secs(30),
        }
    }
}

/// Byte-oriented key-value store with per-entry expiry.
///
/// Implementations report connectivity problems as
/// [`PersistenceError::CacheUnavailable`](crate::PersistenceError::CacheUnavailable);
/// callers on the read path downgrade those to a miss.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short name used in log fields
    fn name(&self) -> &str;

    /// Fetch the value stored under `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Check that the store is reachable
    async fn ping(&self) -> Result<()>;
}

/// Shared cache store handle
pub type SharedCacheStore = Arc<dyn CacheStore>;

/// Wrap a store for sharing between services
pub fn shared_cache<C: CacheStore + 'static>(store: C) -> SharedCacheStore {
    Arc::new(store)
}
