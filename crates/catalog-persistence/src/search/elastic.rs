//! Elasticsearch adapter speaking the `_search` REST API over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{SearchBackend, SearchRequest};
use crate::error::{PersistenceError, Result};
use crate::retry::RetryPolicy;

/// Elasticsearch connection configuration.
#[derive(Debug, Clone)]
pub struct ElasticConfig {
    pub url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9200".to_string(),
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: Value,
}

impl Hit {
    fn into_document(self) -> Value {
        let mut doc = self.source;
        if let Value::Object(map) = &mut doc {
            map.entry("id").or_insert(Value::String(self.id));
        }
        doc
    }
}

/// Elasticsearch client.
#[derive(Debug, Clone)]
pub struct ElasticClient {
    http: Client,
    config: ElasticConfig,
}

impl ElasticClient {
    /// Create a new client. No connection is made until the first request.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be built.
    pub fn new(config: ElasticConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.url.trim_end_matches('/'))
    }

    async fn search_once(&self, request: &SearchRequest) -> Result<Vec<Value>> {
        let response = self
            .http
            .post(self.endpoint(&format!("{}/_search", request.index)))
            .json(&request.body())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PersistenceError::IndexNotFound(request.index.clone()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(PersistenceError::BackendUnavailable(format!(
                "{status} from index '{}'",
                request.index
            )));
        }
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(PersistenceError::MalformedQuery(format!("{status}: {reason}")));
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed.hits.hits.into_iter().map(Hit::into_document).collect())
    }
}

#[async_trait]
impl SearchBackend for ElasticClient {
    fn name(&self) -> &str {
        "elasticsearch"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Value>> {
        tracing::debug!(
            index = %request.index,
            body = %request.body(),
            "Elasticsearch query"
        );
        self.config
            .retry
            .run("search", || self.search_once(request))
            .await
    }

    async fn ping(&self) -> Result<()> {
        let response = self.http.get(self.endpoint("")).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(PersistenceError::BackendUnavailable(format!(
                "ping returned {}",
                response.status()
            )))
        }
    }
}
