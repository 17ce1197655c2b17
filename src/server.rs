//! Server startup and shutdown.
//!
//! `run_server` connects the store and the optional cache, runs migrations,
//! builds the application state and router, and serves until a shutdown
//! signal arrives.

use crate::auth::AuthService;
use crate::cache::Cache;
use crate::config::{CacheConfig, Config};
use crate::db::Repository;
use crate::error::{AppError, AppResult};
use crate::routes;
use crate::state::AppState;
use crate::store::cached::CachedMappingStore;
use crate::store::MappingStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Run the web server with the given configuration.
///
/// # Arguments
///
/// * `config` - The application configuration
/// * `addr` - The address to bind the server to (e.g., "127.0.0.1:3000")
/// * `should_migrate` - Whether to run database migrations on startup
///
/// # Errors
///
/// This function will return an error if:
/// - Database connection fails
/// - Migration fails
/// - Server binding fails
/// - Server runtime error occurs
///
/// An unreachable cache is not an error; the server starts without it.
pub async fn run_server(config: Config, addr: String, should_migrate: bool) -> AppResult<()> {
    info!("Starting clipurl server...");

    info!("Connecting to database...");
    let repository = Repository::new(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
        config.database.acquire_timeout_seconds,
    )
    .await?;

    if should_migrate {
        info!("Running database migrations...");
        repository.run_migrations().await?;
        info!("Migrations completed successfully");
    }

    let repository = Arc::new(repository);
    let cache = connect_cache(&config.cache).await;

    let mappings: Arc<dyn MappingStore> = match &cache {
        Some(cache) => Arc::new(CachedMappingStore::new(repository.clone(), cache.clone())),
        None => repository.clone(),
    };

    let auth_service = AuthService::new(
        config.auth.jwt_secret.clone(),
        config.auth.jwt_expiration_hours,
    );

    let state = Arc::new(AppState::new(
        mappings,
        repository.clone(),
        repository,
        auth_service,
        cache,
        &config.url,
    ));

    let app = routes::create_router(state, config.cors.allowed_origins, config.rate_limit)?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    info!("Server listening on {}", addr);
    info!("Base URL: {}", config.url.base_url);

    // Connect info gives the rate limiter a per-peer key
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(create_shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    info!("Server shutdown complete");
    Ok(())
}

/// Connect to Redis if enabled. Any failure disables caching for this run.
async fn connect_cache(config: &CacheConfig) -> Option<Cache> {
    if !config.enabled {
        info!("Cache disabled by configuration");
        return None;
    }

    info!("Connecting to cache...");
    let cache = match Cache::new(&config.url, config.max_connections, config.default_ttl_seconds)
        .await
    {
        Ok(cache) => cache,
        Err(e) => {
            warn!("Cache setup failed: {}. Continuing without cache.", e);
            return None;
        }
    };

    match cache.ping().await {
        Ok(_) => {
            info!("Cache connection verified");
            Some(cache)
        }
        Err(e) => {
            warn!("Cache ping failed: {}. Continuing without cache.", e);
            None
        }
    }
}

/// Create a future that resolves when a shutdown signal is received.
///
/// On Unix-like systems, this listens for both Ctrl+C (SIGINT) and SIGTERM.
/// On other platforms, it only listens for Ctrl+C.
///
/// # Panics
///
/// Panics if signal handler installation fails, since graceful shutdown is
/// impossible without it.
async fn create_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
