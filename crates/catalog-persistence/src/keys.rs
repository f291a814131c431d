//! # Cache Keys
//!
//! Deterministic, injective mapping from (entity kind, descriptor) to a cache
//! key string.
//!
//! Layout: `<kind>|<variant>|<field>|<field>…` with a fixed field order per
//! variant. A present field is written as `=` followed by its value with `\`
//! and `|` backslash-escaped; an absent field is the bare sentinel `-`. Since
//! every present field starts with `=`, no value can ever spell the sentinel,
//! and escaping keeps the delimiter unambiguous.
//!
//! ```text
//! film|detail|=f1
//! film|search|=star wars
//! film|list|=imdb_rating|=desc|=genre.id|=g1|=20|=0
//! person|list|-|-|-|-|=20|=3
//! film|alike|=f1
//! ```

use std::fmt;

use catalog_domain::{Descriptor, EntityKind};

const DELIMITER: char = '|';
const ESCAPE: char = '\\';
const ABSENT: &str = "-";

/// Variant tag of the related ("alike") lookup
pub const RELATED_TAG: &str = "alike";

/// A computed cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

struct KeyWriter(String);

impl KeyWriter {
    fn new(kind: EntityKind, variant: &str) -> Self {
        let mut key = String::with_capacity(64);
        key.push_str(kind.as_str());
        key.push(DELIMITER);
        key.push_str(variant);
        Self(key)
    }

    fn field(mut self, value: Option<&str>) -> Self {
        self.0.push(DELIMITER);
        match value {
            Some(value) => {
                self.0.push('=');
                for c in value.chars() {
                    if c == DELIMITER || c == ESCAPE {
                        self.0.push(ESCAPE);
                    }
                    self.0.push(c);
                }
            }
            None => self.0.push_str(ABSENT),
        }
        self
    }

    fn finish(self) -> CacheKey {
        CacheKey(self.0)
    }
}

/// Build the cache key for `descriptor` on entities of `kind`.
pub fn build_key(kind: EntityKind, descriptor: &Descriptor) -> CacheKey {
    match descriptor {
        Descriptor::Detail { id } => KeyWriter::new(kind, "detail")
            .field(Some(id.as_str()))
            .finish(),
        Descriptor::Search { text } => KeyWriter::new(kind, "search")
            .field(Some(text.as_str()))
            .finish(),
        Descriptor::Related { id } => KeyWriter::new(kind, RELATED_TAG)
            .field(Some(id.as_str()))
            .finish(),
        Descriptor::List(query) => {
            let sort = query.sort.as_ref();
            let filter = query.filter.as_ref();
            let size = query.page.size().to_string();
            let number = query.page.number().to_string();
            KeyWriter::new(kind, "list")
                .field(sort.map(|s| s.field.as_str()))
                .field(sort.map(|s| s.direction.as_str()))
                .field(filter.map(|f| f.field.as_str()))
                .field(filter.map(|f| f.value.as_str()))
                .field(Some(size.as_str()))
                .field(Some(number.as_str()))
                .finish()
        }
    }
}
