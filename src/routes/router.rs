use crate::config::RateLimitConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::require_user;
use crate::middleware_impls::{
    request_context_middleware, request_id_middleware, AuthAwareKeyExtractor,
};
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::analytics_handlers;
use super::auth_handlers;
use super::health;
use super::url_handlers;
use super::AppState;

/// Shorten requests carry one URL; anything larger is rejected outright
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Create application router
pub fn create_router(
    state: Arc<AppState>,
    allowed_origins: Vec<String>,
    rate_limit_config: RateLimitConfig,
) -> AppResult<axum::Router> {
    let interval_ms = rate_limit_config.replenish_interval_ms();
    let key_extractor = AuthAwareKeyExtractor::new(rate_limit_config.trust_proxy_headers);

    // Strict limits for writes and account endpoints (auth-aware)
    let governor_config_strict = std::sync::Arc::new(GovernorConfigBuilder::default()
        .per_millisecond(interval_ms)
        .burst_size(rate_limit_config.burst_size)
        .key_extractor(key_extractor.clone())
        .finish()
        .ok_or_else(|| AppError::Configuration("Invalid strict rate limit settings".to_string()))?);

    // More lenient limits for redirects
    let governor_config_lenient = GovernorConfigBuilder::default()
        .per_millisecond((interval_ms / 2).max(1))
        .burst_size(rate_limit_config.burst_size.saturating_mul(2))
        .key_extractor(key_extractor.clone())
        .finish()
        .ok_or_else(|| AppError::Configuration("Invalid lenient rate limit settings".to_string()))?;

    // Configure CORS with specific origins
    let cors = if allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|s| s.parse::<http::HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // USER-only API. The auth layer is outermost so the rate limiter can key on the user.
    let api_routes = axum::Router::new()
        .route("/api/urls/shorten", post(url_handlers::shorten))
        .route("/api/urls/myurls", get(url_handlers::my_urls))
        .route(
            "/api/urls/analytics/{short_url}",
            get(analytics_handlers::url_analytics),
        )
        .route("/api/urls/totalClicks", get(analytics_handlers::total_clicks))
        .layer(GovernorLayer::new(governor_config_strict.clone()))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    let auth_routes = axum::Router::new()
        .route("/api/auth/public/login", post(auth_handlers::login))
        .layer(GovernorLayer::new(governor_config_strict));

    let redirect_routes = axum::Router::new()
        .route("/{code}", get(url_handlers::resolve_url))
        .layer(GovernorLayer::new(governor_config_lenient));

    // Health check endpoint (no rate limiting)
    let health_routes = axum::Router::new().route("/_health", get(health::health_check));

    // Outermost first: request id runs before request context so the context can reuse it
    Ok(api_routes
        .merge(auth_routes)
        .merge(redirect_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(middleware::from_fn(request_context_middleware))
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state))
}
