//! # API Context
//!
//! Application state and dependency injection for the route handlers. One
//! cache store and one search backend are built at startup and shared by the
//! three entity services.

use std::sync::Arc;

use catalog_domain::{Film, Genre, Person};
use catalog_persistence::{
    CacheTtl, CatalogEntity, EmptyResultPolicy, EntityService, ReadStrategy, SharedCacheStore,
    SharedSearchBackend,
};

/// Application context shared across all handlers
#[derive(Clone)]
pub struct ApiContext {
    pub films: Arc<EntityService<Film>>,
    pub persons: Arc<EntityService<Person>>,
    pub genres: Arc<EntityService<Genre>>,

    /// Cache store behind every service
    pub cache: SharedCacheStore,

    /// Search backend behind every service
    pub backend: SharedSearchBackend,
}

impl ApiContext {
    /// Create a context with default policies
    pub fn new(cache: SharedCacheStore, backend: SharedSearchBackend) -> Self {
        ApiContextBuilder::new().build_with(cache, backend)
    }
}

/// Builder for ApiContext
pub struct ApiContextBuilder {
    cache: Option<SharedCacheStore>,
    backend: Option<SharedSearchBackend>,
    ttl: CacheTtl,
    empty_results: EmptyResultPolicy,
    read_strategy: ReadStrategy,
}

impl ApiContextBuilder {
    pub fn new() -> Self {
        Self {
            cache: None,
            backend: None,
            ttl: CacheTtl::default(),
            empty_results: EmptyResultPolicy::default(),
            read_strategy: ReadStrategy::default(),
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: SharedCacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: SharedSearchBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: CacheTtl) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub const fn with_empty_result_policy(mut self, policy: EmptyResultPolicy) -> Self {
        self.empty_results = policy;
        self
    }

    #[must_use]
    pub const fn with_read_strategy(mut self, strategy: ReadStrategy) -> Self {
        self.read_strategy = strategy;
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Fails if the cache store or search backend was not supplied.
    pub fn build(mut self) -> Result<ApiContext, &'static str> {
        let cache = self.cache.take().ok_or("Cache store required")?;
        let backend = self.backend.take().ok_or("Search backend required")?;
        Ok(self.build_with(cache, backend))
    }

    fn build_with(&self, cache: SharedCacheStore, backend: SharedSearchBackend) -> ApiContext {
        ApiContext {
            films: Arc::new(self.service(&cache, &backend)),
            persons: Arc::new(self.service(&cache, &backend)),
            genres: Arc::new(self.service(&cache, &backend)),
            cache,
            backend,
        }
    }

    fn service<E: CatalogEntity>(
        &self,
        cache: &SharedCacheStore,
        backend: &SharedSearchBackend,
    ) -> EntityService<E> {
        let config = E::default_config().with_ttl(self.ttl);
        EntityService::with_config(config, Arc::clone(cache), Arc::clone(backend))
            .with_empty_result_policy(self.empty_results)
            .with_read_strategy(self.read_strategy)
    }
}

impl Default for ApiContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
