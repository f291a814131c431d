//! # Search Module
//!
//! Backend-neutral description of the three query shapes the read services
//! need, the Elasticsearch wire body they map to, and the adapters that
//! execute them.
//!
//! ```text
//! SearchRequest { index, query, sort, from, size }
//!        │
//!        ├── ElasticClient        POST {url}/{index}/_search
//!        └── MemorySearchBackend  in-process index
//! ```

#[cfg(feature = "elastic")]
pub mod elastic;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use catalog_domain::{Page, SortSpec};
use serde_json::{Value, json};

use crate::error::Result;

#[cfg(feature = "elastic")]
pub use elastic::{ElasticClient, ElasticConfig};
pub use memory::MemorySearchBackend;

/// Document field holding the backend-assigned identifier
pub const ID_FIELD: &str = "_id";

/// Query shapes understood by every backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Every document in the index
    MatchAll,
    /// Documents whose `field` matches `value`
    FieldMatch { field: String, value: String },
    /// Free text over several fields, tolerant of misspelling
    FuzzyMultiMatch { fields: Vec<String>, text: String },
}

impl SearchQuery {
    pub fn field_match(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::FieldMatch {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn fuzzy<S: AsRef<str>>(fields: &[S], text: impl Into<String>) -> Self {
        Self::FuzzyMultiMatch {
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
            text: text.into(),
        }
    }

    /// Elasticsearch query DSL for this shape
    pub fn to_json(&self) -> Value {
        match self {
            Self::MatchAll => json!({ "match_all": {} }),
            Self::FieldMatch { field, value } => json!({
                "match": { field: { "query": value } }
            }),
            Self::FuzzyMultiMatch { fields, text } => json!({
                "multi_match": {
                    "query": text,
                    "fields": fields,
                    "fuzziness": "auto"
                }
            }),
        }
    }
}

/// One search call against one index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub index: String,
    pub query: SearchQuery,
    pub sort: Option<SortSpec>,
    pub from: Option<u32>,
    pub size: Option<u32>,
}

impl SearchRequest {
    pub fn new(index: impl Into<String>, query: SearchQuery) -> Self {
        Self {
            index: index.into(),
            query,
            sort: None,
            from: None,
            size: None,
        }
    }

    #[must_use]
    pub fn sorted(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    /// Offset pagination: `from = number * size`
    #[must_use]
    pub const fn paginated(mut self, page: Page) -> Self {
        self.from = Some(page.offset());
        self.size = Some(page.size());
        self
    }

    /// Full `_search` request body
    pub fn body(&self) -> Value {
        let mut body = json!({ "query": self.query.to_json() });
        if let Some(from) = self.from {
            body["from"] = json!(from);
        }
        if let Some(size) = self.size {
            body["size"] = json!(size);
        }
        if let Some(sort) = &self.sort {
            body["sort"] = json!([{ sort.field.as_str(): { "order": sort.direction.as_str() } }]);
        }
        body
    }
}

/// Executes search requests and returns matching documents in rank order.
///
/// Each returned value is the stored document with its `id` field present.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short name used in log fields
    fn name(&self) -> &str;

    /// Run `request`, returning raw documents in backend order
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Value>>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<()>;
}

/// Shared search backend handle
pub type SharedSearchBackend = Arc<dyn SearchBackend>;

/// Wrap a backend for sharing between services
pub fn shared_backend<B: SearchBackend + 'static>(backend: B) -> SharedSearchBackend {
    Arc::new(backend)
}
