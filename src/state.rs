use crate::auth::AuthService;
use crate::cache::Cache;
use crate::config::UrlConfig;
use crate::services::{AnalyticsService, LinkService, RedirectService, ShortCodeGenerator};
use crate::store::{ClickEventStore, MappingStore, UserStore};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Wrapped in `Arc` and handed to handlers through Axum's State extraction.
/// Services only see storage through the store traits, so the same router
/// runs against PostgreSQL or the in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub links: LinkService,
    pub redirects: RedirectService,
    pub analytics: AnalyticsService,

    /// Mapping lookups for ownership checks and health probes
    pub mappings: Arc<dyn MappingStore>,

    /// Principal to user resolution
    pub users: Arc<dyn UserStore>,

    /// JWT authentication service for token generation and validation
    pub auth_service: AuthService,

    /// Redis cache, when enabled and reachable; only probed by the health check
    pub cache: Option<Cache>,

    /// Base URL for constructing short URLs (e.g., "http://localhost:3000")
    pub base_url: String,
}

impl AppState {
    pub fn new(
        mappings: Arc<dyn MappingStore>,
        clicks: Arc<dyn ClickEventStore>,
        users: Arc<dyn UserStore>,
        auth_service: AuthService,
        cache: Option<Cache>,
        url: &UrlConfig,
    ) -> Self {
        let generator = ShortCodeGenerator::new(url.short_code_length);
        Self {
            links: LinkService::new(mappings.clone(), clicks.clone(), url),
            redirects: RedirectService::new(mappings.clone(), clicks.clone(), generator),
            analytics: AnalyticsService::new(clicks),
            mappings,
            users,
            auth_service,
            cache,
            base_url: url.base_url.trim_end_matches('/').to_string(),
        }
    }
}
