//! # Catalog REST API
//!
//! HTTP surface of the catalog read cache: films, persons and genres served
//! through cache-aside entity services.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Axum HTTP Server                         │
//! │                 (/api/v1 routes, /health)                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ApiContext                               │
//! │        (EntityService<Film>, <Person>, <Genre>)             │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │     Redis Cache         │   │       Elasticsearch          │
//! │   (JSON, 5 min TTL)     │   │   (Source of Truth)          │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod context;
pub mod error;
pub mod routes;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
};
use catalog_persistence::cache::{
    CacheConfig, MemoryCacheStore, RedisCacheStore, SharedCacheStore, shared_cache,
};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, ConfigError};
pub use context::{ApiContext, ApiContextBuilder};
pub use error::{ApiError, ApiResult};

/// Health check endpoint: pings the cache and the search backend
pub async fn health_check(State(ctx): State<ApiContext>) -> impl IntoResponse {
    let cache = ctx.cache.ping().await;
    let backend = ctx.backend.ping().await;

    let report = |result: &catalog_persistence::Result<()>| match result {
        Ok(()) => "ok".to_string(),
        Err(e) => e.to_string(),
    };
    let (status, overall) = if cache.is_ok() && backend.is_ok() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": overall,
            "cache": { "store": ctx.cache.name(), "status": report(&cache) },
            "backend": { "store": ctx.backend.name(), "status": report(&backend) },
        })),
    )
}

/// Connect the Redis cache, falling back to an in-process store when Redis
/// is unreachable so the service keeps answering from the search backend.
pub async fn connect_cache(config: CacheConfig) -> SharedCacheStore {
    let url = config.url.clone();
    match RedisCacheStore::new(config).await {
        Ok(store) => {
            tracing::info!(%url, "Redis connected");
            shared_cache(store)
        }
        Err(e) => {
            tracing::warn!(%url, error = %e, "Redis not reachable, using in-process cache");
            shared_cache(MemoryCacheStore::new())
        }
    }
}

/// CORS layer for the configured origins; `*` allows any
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(%origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_origin(allow_origin)
        .allow_headers(Any)
}

/// Build the Axum router
pub fn build_router(ctx: ApiContext, cors_origins: &[String]) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        // Health check
        .route("/health", get(health_check))
        .route("/", get(|| async { "Catalog Read Cache API" }))
        // State and middleware
        .with_state(ctx)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
