//! # Catalog Read Cache - Domain Model
//!
//! Catalog entities (films, persons, genres), the entity kinds that tag them,
//! and the normalized request descriptors the read service consumes. These
//! types are shared by the persistence layer and the REST surface.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Largest page a list request may ask for
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// ENTITY KINDS
// =============================================================================

/// The three kinds of catalog entity served by the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Film,
    Person,
    Genre,
}

impl EntityKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Film => "film",
            Self::Person => "person",
            Self::Genre => "genre",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// Genre reference embedded in a film document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Person reference embedded in a film document (director, actor, writer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Film document as stored in the `movies` index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub imdb_rating: Option<f32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genre: Vec<GenreRef>,
    #[serde(default)]
    pub director: Vec<PersonRef>,
    #[serde(default)]
    pub actors: Vec<PersonRef>,
    #[serde(default)]
    pub writers: Vec<PersonRef>,
    #[serde(default)]
    pub actors_names: Vec<String>,
    #[serde(default)]
    pub writers_names: Vec<String>,
}

/// Compact film projection returned by list-shaped endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmShort {
    pub id: String,
    pub title: String,
    pub imdb_rating: Option<f32>,
}

impl From<&Film> for FilmShort {
    fn from(film: &Film) -> Self {
        Self {
            id: film.id.clone(),
            title: film.title.clone(),
            imdb_rating: film.imdb_rating,
        }
    }
}

/// Person document as stored in the `person` index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub film_ids: Vec<String>,
}

/// Genre document as stored in the `genre` index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// REQUEST DESCRIPTORS
// =============================================================================

/// Sort order for list requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(DomainError::MalformedDescriptor(format!(
                "unknown sort direction '{other}'"
            ))),
        }
    }
}

/// Single-field sort
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Parse the `sort` query convention: `field` sorts ascending,
    /// `-field` sorts descending.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MalformedDescriptor`] when no field name is given.
    pub fn from_param(param: &str) -> Result<Self, DomainError> {
        let (field, direction) = match param.strip_prefix('-') {
            Some(field) => (field, SortDirection::Desc),
            None => (param, SortDirection::Asc),
        };
        if field.trim().is_empty() {
            return Err(DomainError::MalformedDescriptor(
                "sort field must not be empty".to_string(),
            ));
        }
        Ok(Self::new(field, direction))
    }
}

/// Exact-match filter on one field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Offset pagination: `number` is zero-based, `size` is positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPage")]
pub struct Page {
    number: u32,
    size: u32,
}

/// Wire shape of a page before validation
#[derive(Deserialize)]
struct RawPage {
    number: u32,
    size: u32,
}

impl TryFrom<RawPage> for Page {
    type Error = DomainError;

    fn try_from(raw: RawPage) -> Result<Self, Self::Error> {
        Self::new(raw.number, raw.size)
    }
}

impl Page {
    /// Build a page, rejecting zero or oversized pages.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MalformedDescriptor`] if `size` is zero, exceeds
    /// [`MAX_PAGE_SIZE`], or the resulting offset does not fit in `u32`.
    pub fn new(number: u32, size: u32) -> Result<Self, DomainError> {
        if size == 0 {
            return Err(DomainError::MalformedDescriptor(
                "page size must be positive".to_string(),
            ));
        }
        if size > MAX_PAGE_SIZE {
            return Err(DomainError::MalformedDescriptor(format!(
                "page size {size} exceeds maximum of {MAX_PAGE_SIZE}"
            )));
        }
        if number.checked_mul(size).is_none() {
            return Err(DomainError::MalformedDescriptor(format!(
                "page number {number} is out of range"
            )));
        }
        Ok(Self { number, size })
    }

    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Offset of the first record, `number * size`
    #[must_use]
    pub const fn offset(&self) -> u32 {
        // checked at construction
        self.number.saturating_mul(self.size)
    }
}

/// Filtered, sorted, paginated listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListQuery {
    pub sort: Option<SortSpec>,
    pub filter: Option<Filter>,
    pub page: Page,
}

impl ListQuery {
    pub const fn new(page: Page) -> Self {
        Self {
            sort: None,
            filter: None,
            page,
        }
    }

    #[must_use]
    pub fn sorted_by(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn filtered_by(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Normalized shape of a read request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum Descriptor {
    Detail { id: String },
    List(ListQuery),
    Search { text: String },
    Related { id: String },
}

impl Descriptor {
    /// Reject descriptors that can never produce a meaningful query.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MalformedDescriptor`] for blank ids, blank
    /// search text, blank sort/filter field names, or an invalid page.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Self::Detail { id } | Self::Related { id } if id.trim().is_empty() => Err(
                DomainError::MalformedDescriptor("id must not be empty".to_string()),
            ),
            Self::Search { text } if text.trim().is_empty() => Err(
                DomainError::MalformedDescriptor("search text must not be empty".to_string()),
            ),
            Self::List(query) => {
                Page::new(query.page.number, query.page.size)?;
                if query.sort.as_ref().is_some_and(|s| s.field.trim().is_empty()) {
                    return Err(DomainError::MalformedDescriptor(
                        "sort field must not be empty".to_string(),
                    ));
                }
                if query.filter.as_ref().is_some_and(|f| f.field.trim().is_empty()) {
                    return Err(DomainError::MalformedDescriptor(
                        "filter field must not be empty".to_string(),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Malformed request: {0}")]
    MalformedDescriptor(String),
}
