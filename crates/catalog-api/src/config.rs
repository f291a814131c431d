//! # API Configuration
//!
//! Environment-based configuration for the catalog REST service.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use catalog_persistence::{
    CacheConfig, CacheTtl, ElasticConfig, EmptyResultPolicy, ENTITY_CACHE_TTL, RetryPolicy,
};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub server_addr: SocketAddr,

    /// Elasticsearch base URL
    pub elastic_url: String,

    /// Redis connection URL
    pub redis_url: String,

    /// Upper bound on the initial Redis connect
    pub cache_connect_timeout: Duration,

    /// Cache empty search/list/alike results
    pub cache_empty_results: bool,

    /// Expiry for cached empty results
    pub cache_empty_ttl: Duration,

    /// Retry policy for cache and search I/O
    pub retry: RetryPolicy,

    /// Logging level
    pub log_level: String,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for any variable that fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for any variable that fails to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let retry = RetryPolicy::new()
            .max_attempts(parsed(&lookup, "RETRY_MAX_ATTEMPTS", 5)?)
            .initial_delay(Duration::from_millis(parsed(&lookup, "RETRY_INITIAL_DELAY_MS", 100)?))
            .max_elapsed(Duration::from_millis(parsed(&lookup, "RETRY_MAX_ELAPSED_MS", 10_000)?));

        Ok(Self {
            server_addr: parsed(&lookup, "SERVER_ADDR", SocketAddr::from(([0, 0, 0, 0], 8000)))?,
            elastic_url: text("ELASTIC_URL", "http://127.0.0.1:9200"),
            redis_url: text("REDIS_URL", "redis://127.0.0.1:6379"),
            cache_connect_timeout: Duration::from_millis(parsed(
                &lookup,
                "CACHE_CONNECT_TIMEOUT_MS",
                5_000,
            )?),
            cache_empty_results: flag(&lookup, "CACHE_EMPTY_RESULTS", true)?,
            cache_empty_ttl: Duration::from_secs(parsed(&lookup, "CACHE_EMPTY_TTL_SECS", 30)?),
            retry,
            log_level: text("LOG_LEVEL", "info"),
            cors_origins: text("CORS_ORIGINS", "*")
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        })
    }

    pub const fn empty_result_policy(&self) -> EmptyResultPolicy {
        if self.cache_empty_results {
            EmptyResultPolicy::Cache
        } else {
            EmptyResultPolicy::Skip
        }
    }

    pub const fn cache_ttl(&self) -> CacheTtl {
        CacheTtl {
            entity: ENTITY_CACHE_TTL,
            empty_result: self.cache_empty_ttl,
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            url: self.redis_url.clone(),
            retry: self.retry,
            connect_timeout: self.cache_connect_timeout,
        }
    }

    pub fn elastic_config(&self) -> ElasticConfig {
        ElasticConfig {
            url: self.elastic_url.clone(),
            retry: self.retry,
            ..ElasticConfig::default()
        }
    }
}

fn parsed<T: FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn flag(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match lookup(name).as_deref().map(str::trim) {
        None => Ok(default),
        Some("true" | "1") => Ok(true),
        Some("false" | "0") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            name,
            value: other.to_string(),
        }),
    }
}
