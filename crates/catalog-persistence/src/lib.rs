//! # Catalog Persistence Library
//!
//! Read-through caching layer for the film catalog: a key-value cache in front
//! of a full-text search backend.
//!
//! ## Architecture
//!
//! One generic read service per entity kind, parameterized by a declarative
//! [`EntityConfig`], applies a pluggable [`ReadStrategy`] over two shared
//! handles:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Application Layer                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                EntityService<Film|Person|Genre>              │
//! │   Descriptor ──► CacheKey ──► ReadStrategy (cache-aside)     │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │      CacheStore         │   │       SearchBackend          │
//! │   (Redis, moka)         │   │ (Elasticsearch, in-memory)   │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `redis`: Enable the Redis cache store (default)
//! - `elastic`: Enable the Elasticsearch backend (default)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalog_persistence::{
//!     cache::{shared_cache, CacheConfig, RedisCacheStore},
//!     search::{shared_backend, ElasticClient, ElasticConfig},
//!     EntityService,
//! };
//! use catalog_domain::Film;
//!
//! let cache = shared_cache(RedisCacheStore::new(CacheConfig::default()).await?);
//! let backend = shared_backend(ElasticClient::new(ElasticConfig::default())?);
//!
//! let films: EntityService<Film> = EntityService::new(cache, backend);
//! let film = films.get_by_id("tt0113277").await?;
//! let alike = films.related("tt0113277").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod entity;
pub mod error;
pub mod keys;
pub mod retry;
pub mod search;
pub mod service;
pub mod strategy;

// Re-export commonly used types
pub use cache::{CacheStore, CacheTtl, MemoryCacheStore, SharedCacheStore, ENTITY_CACHE_TTL};
#[cfg(feature = "redis")]
pub use cache::{CacheConfig, RedisCacheStore};
pub use entity::{CatalogEntity, EntityConfig, RelatedConfig};
pub use error::{PersistenceError, Result};
pub use keys::{CacheKey, build_key};
pub use retry::RetryPolicy;
pub use search::{
    MemorySearchBackend, SearchBackend, SearchQuery, SearchRequest, SharedSearchBackend,
};
#[cfg(feature = "elastic")]
pub use search::{ElasticClient, ElasticConfig};
pub use service::{EmptyResultPolicy, EntityService, Lookup, SharedEntityService};
pub use strategy::ReadStrategy;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
