//! Per-kind entity configuration.
//!
//! An [`EntityConfig`] is plain data: which index to query, which fields free
//! text runs over, which fields may be sorted or filtered on, and how related
//! lookups are shaped. [`CatalogEntity`] ties each entity type to its default
//! config; serde is the codec for both backend documents and cache payloads.

use catalog_domain::{
    DomainError, EntityKind, Film, Filter, Genre, ListQuery, Page, Person, SortDirection, SortSpec,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::CacheTtl;

/// Results fetched per related attribute
pub const RELATED_PAGE_SIZE: u32 = 10;

/// Shape of the per-attribute queries behind a related lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedConfig {
    pub sort: SortSpec,
    pub page: Page,
}

/// Declarative description of one entity kind
#[derive(Debug, Clone)]
pub struct EntityConfig {
    pub kind: EntityKind,
    pub index: String,
    pub search_fields: Vec<String>,
    pub sortable_fields: Vec<String>,
    pub filterable_fields: Vec<String>,
    pub related: Option<RelatedConfig>,
    pub ttl: CacheTtl,
}

fn owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(ToString::to_string).collect()
}

impl EntityConfig {
    pub fn films() -> Self {
        Self {
            kind: EntityKind::Film,
            index: "movies".to_string(),
            search_fields: owned(&["title"]),
            sortable_fields: owned(&["imdb_rating", "title.raw"]),
            filterable_fields: owned(&["genre.id"]),
            related: Page::new(0, RELATED_PAGE_SIZE).ok().map(|page| RelatedConfig {
                sort: SortSpec::new("imdb_rating", SortDirection::Desc),
                page,
            }),
            ttl: CacheTtl::default(),
        }
    }

    pub fn persons() -> Self {
        Self {
            kind: EntityKind::Person,
            index: "person".to_string(),
            search_fields: owned(&["full_name"]),
            sortable_fields: owned(&["full_name.raw"]),
            filterable_fields: owned(&["film_ids", "role"]),
            related: None,
            ttl: CacheTtl::default(),
        }
    }

    pub fn genres() -> Self {
        Self {
            kind: EntityKind::Genre,
            index: "genre".to_string(),
            search_fields: owned(&["name"]),
            sortable_fields: owned(&["name.raw"]),
            filterable_fields: Vec::new(),
            related: None,
            ttl: CacheTtl::default(),
        }
    }

    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: CacheTtl) -> Self {
        self.ttl = ttl;
        self
    }

    /// Check a listing against the sort and filter allow-lists.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MalformedDescriptor`] naming the offending field.
    pub fn check_list(&self, query: &ListQuery) -> Result<(), DomainError> {
        if let Some(sort) = &query.sort {
            if !self.sortable_fields.contains(&sort.field) {
                return Err(DomainError::MalformedDescriptor(format!(
                    "cannot sort {} by '{}'",
                    self.kind, sort.field
                )));
            }
        }
        if let Some(filter) = &query.filter {
            if !self.filterable_fields.contains(&filter.field) {
                return Err(DomainError::MalformedDescriptor(format!(
                    "cannot filter {} by '{}'",
                    self.kind, filter.field
                )));
            }
        }
        Ok(())
    }
}

/// A catalog entity the read service can cache and query
pub trait CatalogEntity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn default_config() -> EntityConfig;

    /// Filters that select entities related to this one, in lookup order
    fn related_filters(&self) -> Vec<Filter> {
        Vec::new()
    }
}

impl CatalogEntity for Film {
    const KIND: EntityKind = EntityKind::Film;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_config() -> EntityConfig {
        EntityConfig::films()
    }

    /// One filter per genre, in the film's genre order
    fn related_filters(&self) -> Vec<Filter> {
        self.genre
            .iter()
            .map(|genre| Filter::new("genre.id", genre.id.as_str()))
            .collect()
    }
}

impl CatalogEntity for Person {
    const KIND: EntityKind = EntityKind::Person;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_config() -> EntityConfig {
        EntityConfig::persons()
    }
}

impl CatalogEntity for Genre {
    const KIND: EntityKind = EntityKind::Genre;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_config() -> EntityConfig {
        EntityConfig::genres()
    }
}
