//! # Catalog REST API Server
//!
//! Binary entry point for the catalog read cache service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_api::{ApiContextBuilder, Config, build_router, connect_cache};
use catalog_persistence::search::{ElasticClient, SearchBackend, shared_backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!(
        version = catalog_api::VERSION,
        "Starting Catalog Read Cache API"
    );

    // Initialize Elasticsearch client
    tracing::info!(url = %config.elastic_url, "Connecting to Elasticsearch");
    let elastic = ElasticClient::new(config.elastic_config())?;
    match elastic.ping().await {
        Ok(()) => tracing::info!("Elasticsearch reachable"),
        Err(e) => tracing::warn!(error = %e, "Elasticsearch not reachable yet, serving anyway"),
    }

    // Initialize Redis cache
    tracing::info!(url = %config.redis_url, "Connecting to Redis");
    let cache = connect_cache(config.cache_config()).await;

    // Build API context
    let api_ctx = ApiContextBuilder::new()
        .with_cache(cache)
        .with_backend(shared_backend(elastic))
        .with_ttl(config.cache_ttl())
        .with_empty_result_policy(config.empty_result_policy())
        .build()
        .map_err(anyhow::Error::msg)?;

    tracing::info!(
        cache_empty_results = config.cache_empty_results,
        empty_ttl_secs = config.cache_empty_ttl.as_secs(),
        retry_attempts = config.retry.max_attempts,
        "Entity services built"
    );

    // Build router
    let app = build_router(api_ctx, &config.cors_origins);

    // Start server
    let addr = config.server_addr;
    tracing::info!(%addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API available at http://{}/api/v1", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
