//! # API Error Types
//!
//! Unified error handling for the REST layer.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog_domain::DomainError;
use catalog_persistence::PersistenceError;
use thiserror::Error;

use crate::config::ConfigError;

/// API-level errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{entity_type} not found: '{id}'")]
    NotFound { entity_type: &'static str, id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ApiError {
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Get HTTP status code for this error
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) | Self::Persistence(PersistenceError::MalformedDescriptor(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Persistence(
                PersistenceError::BackendUnavailable(_) | PersistenceError::CacheUnavailable(_),
            ) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Persistence(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get machine-readable error code
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidInput(_) | Self::Persistence(PersistenceError::MalformedDescriptor(_)) => {
                "INVALID_INPUT"
            }
            Self::Persistence(
                PersistenceError::BackendUnavailable(_) | PersistenceError::CacheUnavailable(_),
            ) => "BACKEND_UNAVAILABLE",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "Request failed");
        }
        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "code": self.error_code(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::not_found("film", "f1").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(DomainError::MalformedDescriptor("bad".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PersistenceError::from(DomainError::MalformedDescriptor("bad".into())))
                .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PersistenceError::BackendUnavailable("down".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(PersistenceError::Serialization("eof".into())).error_code(),
            "PERSISTENCE_ERROR"
        );
    }
}
