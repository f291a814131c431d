//! Cache-aside read service, generic over the catalog entity kind.
//!
//! Every operation follows the same path: build a normalized [`Descriptor`],
//! derive its [`CacheKey`], then hand three closures (cache probe, backend
//! query, cache fill) to the configured [`ReadStrategy`]. Payloads are JSON
//! produced by the entity's serde impl.

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use catalog_domain::{
    Descriptor, DomainError, Film, Filter, ListQuery, Page, SortDirection, SortSpec,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::SharedCacheStore;
use crate::entity::{CatalogEntity, EntityConfig, RelatedConfig};
use crate::error::{PersistenceError, Result};
use crate::keys::{CacheKey, build_key};
use crate::search::{ID_FIELD, SearchQuery, SearchRequest, SharedSearchBackend};
use crate::strategy::ReadStrategy;

/// Films returned by [`EntityService::popular_in_genre`]
pub const POPULAR_IN_GENRE_SIZE: u32 = 30;

/// What to do with a search, list or related result that came back empty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyResultPolicy {
    /// Cache it under the config's `empty_result` TTL
    #[default]
    Cache,
    /// Leave the key unset so the next request asks the backend again
    Skip,
}

/// Result of [`EntityService::fetch`]
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<E> {
    One(Option<E>),
    Many(Vec<E>),
}

impl<E> Lookup<E> {
    /// True when nothing was found
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(entity) => entity.is_none(),
            Self::Many(entities) => entities.is_empty(),
        }
    }
}

/// Read service for one entity kind.
pub struct EntityService<E> {
    config: EntityConfig,
    cache: SharedCacheStore,
    backend: SharedSearchBackend,
    read_strategy: ReadStrategy,
    empty_results: EmptyResultPolicy,
    _entity: PhantomData<fn() -> E>,
}

impl<E: CatalogEntity> EntityService<E> {
    /// Create a service with the entity's default config and strategies.
    pub fn new(cache: SharedCacheStore, backend: SharedSearchBackend) -> Self {
        Self::with_config(E::default_config(), cache, backend)
    }

    pub fn with_config(
        config: EntityConfig,
        cache: SharedCacheStore,
        backend: SharedSearchBackend,
    ) -> Self {
        Self {
            config,
            cache,
            backend,
            read_strategy: ReadStrategy::default(),
            empty_results: EmptyResultPolicy::default(),
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub const fn with_read_strategy(mut self, strategy: ReadStrategy) -> Self {
        self.read_strategy = strategy;
        self
    }

    #[must_use]
    pub const fn with_empty_result_policy(mut self, policy: EmptyResultPolicy) -> Self {
        self.empty_results = policy;
        self
    }

    pub const fn config(&self) -> &EntityConfig {
        &self.config
    }

    /// Look up one entity by id. Absence is returned but never cached.
    ///
    /// # Errors
    ///
    /// Fails on a blank id, or when the backend is unavailable after retries.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<E>> {
        let key = self.key_for(&Descriptor::Detail { id: id.to_string() })?;
        let request =
            SearchRequest::new(&self.config.index, SearchQuery::field_match(ID_FIELD, id))
                .paginated(Page::new(0, 1)?);

        self.read_strategy
            .read(
                || self.cached::<E>(&key),
                || self.query_one(request),
                |entity: &E| {
                    let payload = serde_json::to_vec(entity).map_err(PersistenceError::from);
                    self.store(&key, payload, Some(self.config.ttl.entity))
                },
            )
            .await
    }

    /// Fuzzy free-text search over the configured search fields.
    ///
    /// # Errors
    ///
    /// Fails on blank text, or when the backend is unavailable after retries.
    pub async fn search(&self, text: &str) -> Result<Vec<E>> {
        let key = self.key_for(&Descriptor::Search { text: text.to_string() })?;
        let request = SearchRequest::new(
            &self.config.index,
            SearchQuery::fuzzy(&self.config.search_fields, text),
        );
        self.read_list(&key, || self.query_found(request)).await
    }

    /// Filtered, sorted, paginated listing.
    ///
    /// # Errors
    ///
    /// Fails before any I/O when the sort or filter field is not allowed for
    /// this kind, or when the backend is unavailable after retries.
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<E>> {
        self.config.check_list(query)?;
        let key = self.key_for(&Descriptor::List(query.clone()))?;

        let search = query.filter.as_ref().map_or(SearchQuery::MatchAll, |f| {
            SearchQuery::field_match(f.field.as_str(), f.value.as_str())
        });
        let request = SearchRequest::new(&self.config.index, search)
            .sorted(query.sort.clone())
            .paginated(query.page);
        self.read_list(&key, || self.query_found(request)).await
    }

    /// Entities related to `id`: one ranked query per related attribute of
    /// the subject, concatenated in attribute order. Duplicates are kept. An
    /// unknown subject yields an empty list that is not cached.
    ///
    /// # Errors
    ///
    /// Fails with [`PersistenceError::MalformedDescriptor`] if this kind has
    /// no related lookup, or when the backend is unavailable after retries.
    pub async fn related(&self, id: &str) -> Result<Vec<E>> {
        let Some(related) = self.config.related.clone() else {
            return Err(DomainError::MalformedDescriptor(format!(
                "{} has no related lookup",
                self.config.kind
            ))
            .into());
        };
        let key = self.key_for(&Descriptor::Related { id: id.to_string() })?;

        self.read_list(&key, || self.query_related(id, related)).await
    }

    /// Dispatch any descriptor to the matching operation.
    ///
    /// # Errors
    ///
    /// As for the operation the descriptor selects.
    pub async fn fetch(&self, descriptor: &Descriptor) -> Result<Lookup<E>> {
        descriptor.validate()?;
        match descriptor {
            Descriptor::Detail { id } => self.get_by_id(id).await.map(Lookup::One),
            Descriptor::Search { text } => self.search(text).await.map(Lookup::Many),
            Descriptor::List(query) => self.list(query).await.map(Lookup::Many),
            Descriptor::Related { id } => self.related(id).await.map(Lookup::Many),
        }
    }

    fn key_for(&self, descriptor: &Descriptor) -> Result<CacheKey> {
        descriptor.validate()?;
        Ok(build_key(E::KIND, descriptor))
    }

    /// Cache-aside read of a list-shaped result; `backend_fn` returning
    /// `None` yields an empty list and skips the fill.
    async fn read_list<F, Fut>(&self, key: &CacheKey, backend_fn: F) -> Result<Vec<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Vec<E>>>>,
    {
        let found = self
            .read_strategy
            .read(
                || self.cached::<Vec<E>>(key),
                backend_fn,
                |entities: &Vec<E>| {
                    let payload = serde_json::to_vec(entities).map_err(PersistenceError::from);
                    self.store(key, payload, self.list_ttl(entities.len()))
                },
            )
            .await?;
        Ok(found.unwrap_or_default())
    }

    const fn list_ttl(&self, len: usize) -> Option<Duration> {
        if len > 0 {
            return Some(self.config.ttl.entity);
        }
        match self.empty_results {
            EmptyResultPolicy::Cache => Some(self.config.ttl.empty_result),
            EmptyResultPolicy::Skip => None,
        }
    }

    /// Probe the cache. A payload that no longer decodes is reported as an
    /// error so the strategy falls through to the backend and overwrites it.
    async fn cached<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        let Some(bytes) = self.cache.get(key.as_str()).await? else {
            debug!(key = %key, kind = %E::KIND, "Cache miss");
            return Ok(None);
        };
        debug!(key = %key, kind = %E::KIND, "Cache hit");
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn store(
        &self,
        key: &CacheKey,
        payload: Result<Vec<u8>>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let Some(ttl) = ttl else {
            debug!(key = %key, "Empty result not cached");
            return Ok(());
        };
        self.cache.set(key.as_str(), &payload?, ttl).await?;
        debug!(key = %key, ttl_secs = ttl.as_secs(), store = self.cache.name(), "Cache filled");
        Ok(())
    }

    async fn query_one(&self, request: SearchRequest) -> Result<Option<E>> {
        Ok(self.query(request).await?.into_iter().next())
    }

    async fn query_found(&self, request: SearchRequest) -> Result<Option<Vec<E>>> {
        self.query(request).await.map(Some)
    }

    /// `None` when the subject itself does not exist
    async fn query_related(&self, id: &str, related: RelatedConfig) -> Result<Option<Vec<E>>> {
        let Some(subject) = self.get_by_id(id).await? else {
            debug!(id, kind = %E::KIND, "Related subject not found");
            return Ok(None);
        };
        let mut results = Vec::new();
        for filter in subject.related_filters() {
            let request = SearchRequest::new(
                &self.config.index,
                SearchQuery::field_match(filter.field, filter.value),
            )
            .sorted(Some(related.sort.clone()))
            .paginated(related.page);
            results.extend(self.query(request).await?);
        }
        Ok(Some(results))
    }

    /// Run a backend query and decode its documents. A missing index is an
    /// empty result.
    async fn query(&self, request: SearchRequest) -> Result<Vec<E>> {
        let docs = match self.backend.search(&request).await {
            Ok(docs) => docs,
            Err(PersistenceError::IndexNotFound(index)) => {
                warn!(
                    index = %index,
                    backend = self.backend.name(),
                    "Index not found, returning no results"
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(PersistenceError::from))
            .collect()
    }
}

impl EntityService<Film> {
    /// Top rated films in a genre.
    ///
    /// # Errors
    ///
    /// As for [`EntityService::list`].
    pub async fn popular_in_genre(&self, genre_id: &str) -> Result<Vec<Film>> {
        let query = ListQuery::new(Page::new(0, POPULAR_IN_GENRE_SIZE)?)
            .sorted_by(SortSpec::new("imdb_rating", SortDirection::Desc))
            .filtered_by(Filter::new("genre.id", genre_id));
        self.list(&query).await
    }
}

/// Shared handle to a service
pub type SharedEntityService<E> = std::sync::Arc<EntityService<E>>;
