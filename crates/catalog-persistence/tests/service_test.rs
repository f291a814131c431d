//! Cache-aside scenarios for [`EntityService`] over in-memory stores with
//! counting and failing doubles.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use catalog_domain::{
    Descriptor, EntityKind, Film, Filter, Genre, ListQuery, Page, Person, SortSpec,
};
use catalog_persistence::{
    CacheStore, CatalogEntity, EmptyResultPolicy, EntityConfig, EntityService, Lookup,
    MemoryCacheStore, MemorySearchBackend, PersistenceError, ReadStrategy, Result, SearchBackend,
    SearchRequest, SharedCacheStore, SharedSearchBackend, build_key,
};
use fake::Fake;
use fake::faker::lorem::en::Sentence;
use serde_json::{Value, json};
use tokio_test::{assert_err, assert_ok};

// =============================================================================
// TEST DOUBLES
// =============================================================================

#[derive(Default)]
struct CountingCache {
    inner: MemoryCacheStore,
    gets: AtomicU32,
    sets: AtomicU32,
}

impl CountingCache {
    fn sets(&self) -> u32 {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for CountingCache {
    fn name(&self) -> &str {
        "counting"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// A cache whose every call fails, as when Redis is unreachable
struct BrokenCache;

#[async_trait]
impl CacheStore for BrokenCache {
    fn name(&self) -> &str {
        "broken"
    }

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(PersistenceError::CacheUnavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<()> {
        Err(PersistenceError::CacheUnavailable("connection refused".into()))
    }

    async fn ping(&self) -> Result<()> {
        Err(PersistenceError::CacheUnavailable("connection refused".into()))
    }
}

struct CountingBackend {
    inner: MemorySearchBackend,
    calls: AtomicU32,
}

impl CountingBackend {
    fn new(inner: MemorySearchBackend) -> Self {
        Self {
            inner,
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for CountingBackend {
    fn name(&self) -> &str {
        "counting"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.search(request).await
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

struct DownBackend;

#[async_trait]
impl SearchBackend for DownBackend {
    fn name(&self) -> &str {
        "down"
    }

    async fn search(&self, _request: &SearchRequest) -> Result<Vec<Value>> {
        Err(PersistenceError::BackendUnavailable("timed out".into()))
    }

    async fn ping(&self) -> Result<()> {
        Err(PersistenceError::BackendUnavailable("timed out".into()))
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

fn film_doc(id: &str, title: &str, rating: f64, genres: &[&str]) -> Value {
    let genre: Vec<Value> = genres
        .iter()
        .map(|g| json!({ "id": g, "name": g.to_uppercase() }))
        .collect();
    json!({ "id": id, "title": title, "imdb_rating": rating, "genre": genre })
}

/// Subject `subject` sits in g1 and g2; twelve films in each genre plus
/// `both`, the top rated film, in the two of them.
fn catalog() -> MemorySearchBackend {
    let mut docs = vec![
        film_doc("subject", "The Subject", 1.0, &["g1", "g2"]),
        film_doc("both", "Crossover", 9.9, &["g1", "g2"]),
        film_doc("dog", "Top Dog", 4.0, &["g3"]),
    ];
    for i in 0..12 {
        let rating = 5.0 + f64::from(i) * 0.25;
        docs.push(film_doc(&format!("a{i}"), &format!("Feature a{i}"), rating, &["g1"]));
        docs.push(film_doc(&format!("b{i}"), &format!("Feature b{i}"), rating, &["g2"]));
    }
    MemorySearchBackend::new()
        .with_documents("movies", docs)
        .with_documents(
            "genre",
            [json!({ "id": "g1", "name": "Drama" }), json!({ "id": "g2", "name": "Comedy" })],
        )
        .with_documents("person", [])
}

struct Harness {
    cache: Arc<CountingCache>,
    backend: Arc<CountingBackend>,
}

impl Harness {
    fn new() -> Self {
        Self {
            cache: Arc::new(CountingCache::default()),
            backend: Arc::new(CountingBackend::new(catalog())),
        }
    }

    fn service<E: CatalogEntity>(&self) -> EntityService<E> {
        let cache: SharedCacheStore = self.cache.clone();
        let backend: SharedSearchBackend = self.backend.clone();
        EntityService::new(cache, backend)
    }
}

fn ids(films: &[Film]) -> Vec<&str> {
    films.iter().map(|f| f.id.as_str()).collect()
}

// =============================================================================
// GET BY ID
// =============================================================================

#[tokio::test]
async fn get_by_id_miss_queries_once_and_fills_once() {
    let h = Harness::new();
    let films = h.service::<Film>();

    let first = assert_ok!(films.get_by_id("both").await).unwrap();
    assert_eq!(first.title, "Crossover");
    assert_eq!(h.backend.calls(), 1);
    assert_eq!(h.cache.sets(), 1);

    let second = assert_ok!(films.get_by_id("both").await).unwrap();
    assert_eq!(second, first);
    assert_eq!(h.backend.calls(), 1, "hit must not reach the backend");
    assert_eq!(h.cache.sets(), 1);
}

#[tokio::test]
async fn get_by_id_absent_is_not_cached() {
    let h = Harness::new();
    let films = h.service::<Film>();

    assert!(assert_ok!(films.get_by_id("missing").await).is_none());
    assert!(assert_ok!(films.get_by_id("missing").await).is_none());
    assert_eq!(h.backend.calls(), 2);
    assert_eq!(h.cache.sets(), 0);
}

#[tokio::test]
async fn get_by_id_blank_is_rejected_before_io() {
    let h = Harness::new();
    let err = assert_err!(h.service::<Film>().get_by_id("  ").await);
    assert!(matches!(err, PersistenceError::MalformedDescriptor(_)));
    assert_eq!(h.backend.calls(), 0);
}

#[tokio::test]
async fn round_trip_through_cache_preserves_entity() {
    let h = Harness::new();
    let description: String = Sentence(3..8).fake();
    h.backend
        .inner
        .insert("genre", json!({ "id": "g9", "name": "Noir", "description": &description }))
        .await;
    let genres = h.service::<Genre>();

    let fresh = assert_ok!(genres.get_by_id("g9").await);
    let cached = assert_ok!(genres.get_by_id("g9").await);
    assert_eq!(fresh, cached);
    assert_eq!(h.backend.calls(), 1);
    assert_eq!(cached.unwrap().description, Some(description));
}

#[tokio::test]
async fn undecodable_cache_entry_is_replaced() {
    let h = Harness::new();
    let films = h.service::<Film>();
    let key = build_key(EntityKind::Film, &Descriptor::Detail { id: "both".into() });
    assert_ok!(h.cache.set(key.as_str(), b"{not json", Duration::from_secs(60)).await);

    let film = assert_ok!(films.get_by_id("both").await).unwrap();
    assert_eq!(film.id, "both");
    assert_eq!(h.backend.calls(), 1);

    let stored = assert_ok!(h.cache.get(key.as_str()).await).unwrap();
    let decoded: Film = serde_json::from_slice(&stored).unwrap();
    assert_eq!(decoded, film);
}

// =============================================================================
// STORE AND BACKEND FAILURES
// =============================================================================

#[tokio::test]
async fn broken_cache_is_transparent() {
    let backend = Arc::new(CountingBackend::new(catalog()));
    let shared: SharedSearchBackend = backend.clone();
    let films: EntityService<Film> = EntityService::new(Arc::new(BrokenCache), shared);

    let film = assert_ok!(films.get_by_id("dog").await);
    assert_eq!(film.unwrap().title, "Top Dog");
    let hits = assert_ok!(films.search("dog").await);
    assert_eq!(ids(&hits), vec!["dog"]);
    assert_ok!(films.get_by_id("dog").await);
    assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn backend_failure_surfaces_and_caches_nothing() {
    let cache = Arc::new(CountingCache::default());
    let shared: SharedCacheStore = cache.clone();
    let films: EntityService<Film> = EntityService::new(shared, Arc::new(DownBackend));

    let err = assert_err!(films.get_by_id("f1").await);
    assert!(matches!(err, PersistenceError::BackendUnavailable(_)));
    assert!(err.is_transient());
    assert_eq!(cache.sets(), 0);
}

// =============================================================================
// SEARCH AND LIST
// =============================================================================

#[tokio::test]
async fn fuzzy_search_tolerates_one_typo() {
    let h = Harness::new();
    let films = h.service::<Film>();

    assert_eq!(ids(&assert_ok!(films.search("dog").await)), vec!["dog"]);
    assert_eq!(ids(&assert_ok!(films.search("dogg").await)), vec!["dog"]);
}

#[tokio::test]
async fn empty_search_cached_by_default() {
    let h = Harness::new();
    let films = h.service::<Film>();

    assert!(assert_ok!(films.search("zzzzzzzzzz").await).is_empty());
    assert!(assert_ok!(films.search("zzzzzzzzzz").await).is_empty());
    assert_eq!(h.backend.calls(), 1);
    assert_eq!(h.cache.sets(), 1);
}

#[tokio::test]
async fn empty_search_skipped_under_skip_policy() {
    let h = Harness::new();
    let films = h
        .service::<Film>()
        .with_empty_result_policy(EmptyResultPolicy::Skip);

    assert!(assert_ok!(films.search("zzzzzzzzzz").await).is_empty());
    assert!(assert_ok!(films.search("zzzzzzzzzz").await).is_empty());
    assert_eq!(h.backend.calls(), 2);
    assert_eq!(h.cache.sets(), 0);
}

#[tokio::test]
async fn list_of_unknown_genre_is_empty() {
    let h = Harness::new();
    let query = ListQuery::new(Page::new(0, 20).unwrap())
        .sorted_by(SortSpec::from_param("-imdb_rating").unwrap())
        .filtered_by(Filter::new("genre.id", "nope"));

    let films = assert_ok!(h.service::<Film>().list(&query).await);
    assert!(films.is_empty());
}

#[tokio::test]
async fn list_on_empty_index_is_empty() {
    let cache = Arc::new(CountingCache::default());
    let backend = Arc::new(CountingBackend::new(
        MemorySearchBackend::new().with_documents("movies", []),
    ));
    let films = EntityService::<Film>::new(cache.clone(), backend.clone());
    let query = ListQuery::new(Page::new(0, 20).unwrap())
        .sorted_by(SortSpec::from_param("-imdb_rating").unwrap());

    assert!(assert_ok!(films.list(&query).await).is_empty());
    assert!(assert_ok!(films.list(&query).await).is_empty());
    assert_eq!(backend.calls(), 1);
    assert_eq!(cache.sets(), 1);
}

#[tokio::test]
async fn list_sorts_and_paginates() {
    let h = Harness::new();
    let films = h.service::<Film>();
    let sort = SortSpec::from_param("-imdb_rating").unwrap();

    let first = ListQuery::new(Page::new(0, 3).unwrap()).sorted_by(sort.clone());
    assert_eq!(ids(&assert_ok!(films.list(&first).await)), vec!["both", "a11", "b11"]);

    let second = ListQuery::new(Page::new(1, 3).unwrap()).sorted_by(sort);
    assert_eq!(ids(&assert_ok!(films.list(&second).await)), vec!["a10", "b10", "a9"]);
    assert_eq!(h.backend.calls(), 2, "distinct pages are distinct keys");
}

#[tokio::test]
async fn list_rejects_unknown_sort_field_without_io() {
    let h = Harness::new();
    let query =
        ListQuery::new(Page::new(0, 20).unwrap()).sorted_by(SortSpec::from_param("-budget").unwrap());

    let err = assert_err!(h.service::<Film>().list(&query).await);
    assert!(matches!(err, PersistenceError::MalformedDescriptor(_)));
    assert_eq!(h.backend.calls(), 0);
    assert_eq!(h.cache.gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_index_reads_as_empty() {
    let h = Harness::new();
    let persons = EntityService::<Person>::with_config(
        EntityConfig::persons().with_index("people_v2"),
        h.cache.clone(),
        h.backend.clone(),
    );
    assert!(assert_ok!(persons.search("adam").await).is_empty());
}

#[tokio::test]
async fn popular_in_genre_ranks_by_rating() {
    let h = Harness::new();
    let films = assert_ok!(h.service::<Film>().popular_in_genre("g2").await);

    assert_eq!(films.len(), 14);
    assert_eq!(films[0].id, "both");
    assert_eq!(films[1].id, "b11");
    assert_eq!(films.last().map(|f| f.id.as_str()), Some("subject"));
}

// =============================================================================
// RELATED
// =============================================================================

#[tokio::test]
async fn related_concatenates_ranked_genres_with_duplicates() {
    let h = Harness::new();
    let films = h.service::<Film>();

    let alike = assert_ok!(films.related("subject").await);
    assert_eq!(alike.len(), 20);

    let mut expected = vec!["both".to_string()];
    expected.extend((3..12).rev().map(|i| format!("a{i}")));
    expected.push("both".to_string());
    expected.extend((3..12).rev().map(|i| format!("b{i}")));
    let got: Vec<String> = alike.iter().map(|f| f.id.clone()).collect();
    assert_eq!(got, expected);

    // subject lookup plus one query per genre
    assert_eq!(h.backend.calls(), 3);
    assert_ok!(films.related("subject").await);
    assert_eq!(h.backend.calls(), 3);
}

#[tokio::test]
async fn related_unknown_subject_is_empty_and_uncached() {
    let h = Harness::new();
    let films = h.service::<Film>();

    assert!(assert_ok!(films.related("ghost").await).is_empty());
    assert!(assert_ok!(films.related("ghost").await).is_empty());
    assert_eq!(h.backend.calls(), 2);
    assert_eq!(h.cache.sets(), 0);
}

// =============================================================================
// STRATEGIES AND DISPATCH
// =============================================================================

#[tokio::test]
async fn backend_only_never_touches_cache() {
    let h = Harness::new();
    let films = h
        .service::<Film>()
        .with_read_strategy(ReadStrategy::BackendOnly);

    assert_ok!(films.get_by_id("dog").await);
    assert_ok!(films.get_by_id("dog").await);
    assert_eq!(h.backend.calls(), 2);
    assert_eq!(h.cache.sets(), 0);
}

#[tokio::test]
async fn fetch_dispatches_by_variant() {
    let h = Harness::new();
    let genres = h.service::<Genre>();

    let one = assert_ok!(genres.fetch(&Descriptor::Detail { id: "g2".into() }).await);
    assert!(matches!(one, Lookup::One(Some(ref g)) if g.name == "Comedy"));

    let page = ListQuery::new(Page::new(0, 50).unwrap());
    let many = assert_ok!(genres.fetch(&Descriptor::List(page)).await);
    assert!(matches!(many, Lookup::Many(ref all) if all.len() == 2));

    assert_err!(genres.fetch(&Descriptor::Search { text: String::new() }).await);
}
