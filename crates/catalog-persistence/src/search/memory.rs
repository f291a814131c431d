//! In-process [`SearchBackend`] approximating the Elasticsearch behaviour the
//! services rely on: exact field match, fuzzy multi-field match with "auto"
//! fuzziness, single-field sort and offset pagination.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use catalog_domain::{SortDirection, SortSpec};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{ID_FIELD, SearchBackend, SearchQuery, SearchRequest};
use crate::error::{PersistenceError, Result};

/// Page size Elasticsearch applies when a request names none
const DEFAULT_SIZE: usize = 10;

/// In-memory document indices
#[derive(Debug, Default)]
pub struct MemorySearchBackend {
    indices: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemorySearchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an index with documents, creating it if needed
    #[must_use]
    pub fn with_documents(mut self, index: &str, docs: impl IntoIterator<Item = Value>) -> Self {
        self.indices
            .get_mut()
            .entry(index.to_string())
            .or_default()
            .extend(docs);
        self
    }

    /// Create an empty index
    pub async fn create_index(&self, index: &str) {
        self.indices.write().await.entry(index.to_string()).or_default();
    }

    /// Append a document, creating the index if needed
    pub async fn insert(&self, index: &str, doc: Value) {
        self.indices
            .write()
            .await
            .entry(index.to_string())
            .or_default()
            .push(doc);
    }
}

#[async_trait]
impl SearchBackend for MemorySearchBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Value>> {
        let indices = self.indices.read().await;
        let docs = indices
            .get(&request.index)
            .ok_or_else(|| PersistenceError::IndexNotFound(request.index.clone()))?;

        let mut scored: Vec<(usize, &Value)> = docs
            .iter()
            .filter_map(|doc| score(&request.query, doc).map(|s| (s, doc)))
            .collect();

        match &request.sort {
            Some(sort) => scored.sort_by(|(_, a), (_, b)| compare_by(sort, a, b)),
            // relevance order, stable on ties
            None => scored.sort_by(|(a, _), (b, _)| b.cmp(a)),
        }

        let from = request.from.map_or(0, |f| f as usize);
        let size = request.size.map_or(DEFAULT_SIZE, |s| s as usize);
        Ok(scored
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Relevance of `doc` for `query`, `None` when it does not match
fn score(query: &SearchQuery, doc: &Value) -> Option<usize> {
    match query {
        SearchQuery::MatchAll => Some(1),
        SearchQuery::FieldMatch { field, value } => values_at(doc, field)
            .iter()
            .any(|v| scalar_text(v).is_some_and(|t| t.eq_ignore_ascii_case(value)))
            .then_some(1),
        SearchQuery::FuzzyMultiMatch { fields, text } => {
            let tokens: Vec<String> = fields
                .iter()
                .flat_map(|f| values_at(doc, f))
                .filter_map(scalar_text)
                .flat_map(|t| tokenize(&t))
                .collect();
            let matched = tokenize(text)
                .iter()
                .filter(|term| tokens.iter().any(|token| fuzzy_eq(term, token)))
                .count();
            (matched > 0).then_some(matched)
        }
    }
}

/// Leaf values under a dotted path, flattening arrays on the way
fn values_at<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let path = if path == ID_FIELD { "id" } else { path };
    // keyword sub-fields live on the parent in an unanalysed store
    let path = path.strip_suffix(".raw").unwrap_or(path);

    let mut current = vec![doc];
    for segment in path.split('.') {
        current = current
            .into_iter()
            .flat_map(|v| match v {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .filter_map(|v| v.get(segment))
            .collect();
    }
    current
        .into_iter()
        .flat_map(|v| match v {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Edits allowed for a term under Elasticsearch's `AUTO` fuzziness
const fn auto_fuzziness(term_len: usize) -> usize {
    match term_len {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

fn fuzzy_eq(term: &str, token: &str) -> bool {
    let allowed = auto_fuzziness(term.chars().count());
    edit_distance(term, token) <= allowed
}

/// Optimal string alignment distance (Levenshtein plus adjacent transpositions)
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut d = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        d[0][j] = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            d[i][j] = (d[i - 1][j] + 1)
                .min(d[i][j - 1] + 1)
                .min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                d[i][j] = d[i][j].min(d[i - 2][j - 2] + 1);
            }
        }
    }
    d[a.len()][b.len()]
}

/// Sort key comparison; documents missing the field sort last either way
fn compare_by(sort: &SortSpec, a: &Value, b: &Value) -> Ordering {
    let key_a = values_at(a, &sort.field).into_iter().next();
    let key_b = values_at(b, &sort.field).into_iter().next();
    match (key_a, key_b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ord = compare_values(x, y);
            match sort.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => scalar_text(a).cmp(&scalar_text(b)),
    }
}
