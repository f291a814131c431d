//! Persistence layer error types

use catalog_domain::DomainError;
use thiserror::Error;

/// Persistence layer errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Cache rejected command: {0}")]
    CacheRejected(String),

    #[error("Search backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Search index not found: {0}")]
    IndexNotFound(String),

    #[error("Malformed search query: {0}")]
    MalformedQuery(String),

    #[error(transparent)]
    MalformedDescriptor(#[from] DomainError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PersistenceError {
    /// Whether retrying the same call may succeed.
    ///
    /// Connectivity problems on either side are transient; query, index and
    /// payload errors are not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::CacheUnavailable(_) | Self::BackendUnavailable(_))
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for PersistenceError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_dropped()
            || err.is_connection_refusal()
            || err.is_timeout()
        {
            Self::CacheUnavailable(err.to_string())
        } else {
            // WRONGTYPE, OOM, bad URL: repeating the command cannot help
            Self::CacheRejected(err.to_string())
        }
    }
}

#[cfg(feature = "elastic")]
impl From<reqwest::Error> for PersistenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Serialization(err.to_string())
        } else if err.is_builder() {
            Self::MalformedQuery(err.to_string())
        } else {
            Self::BackendUnavailable(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
