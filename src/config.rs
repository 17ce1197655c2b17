mod auth;
mod cache;
mod cors;
mod database;
mod rate_limit;
mod server;
mod url;

pub use self::auth::AuthConfig;
pub use self::cache::CacheConfig;
pub use self::cors::CorsConfig;
pub use self::database::DatabaseConfig;
pub use self::rate_limit::RateLimitConfig;
pub use self::server::ServerConfig;
pub use self::url::UrlConfig;

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub url: UrlConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
}

/// Read `key`, falling back to `default` when unset
fn env_or<T: FromStr>(key: &str, default: &str) -> AppResult<T> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| AppError::Configuration(format!("Invalid {}", key)))
}

fn required(key: &str) -> AppResult<String> {
    env::var(key).map_err(|_| AppError::MissingEnvVar(key.to_string()))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let server = ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("SERVER_PORT", "3000")?,
        };

        let database = DatabaseConfig {
            url: required("DATABASE_URL")?,
            max_connections: env_or("DB_MAX_CONNECTIONS", "10")?,
            min_connections: env_or("DB_MIN_CONNECTIONS", "1")?,
            acquire_timeout_seconds: env_or("DB_ACQUIRE_TIMEOUT_SECONDS", "30")?,
        };

        let cache = CacheConfig {
            enabled: env_or("CACHE_ENABLED", "true")?,
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            max_connections: env_or("CACHE_MAX_CONNECTIONS", "10")?,
            default_ttl_seconds: env_or("CACHE_DEFAULT_TTL_SECONDS", "3600")?,
        };

        let url = UrlConfig {
            short_code_length: env_or("SHORT_CODE_LENGTH", "8")?,
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| format!("http://{}:{}", server.host, server.port)),
            short_code_max_attempts: env_or("SHORT_CODE_MAX_ATTEMPTS", "5")?,
            strict_url_validation: env_or("STRICT_URL_VALIDATION", "true")?,
        };

        // Authentication config
        let auth = AuthConfig {
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_hours: env_or("JWT_EXPIRATION_HOURS", "24")?,
        };

        let rate_limit = RateLimitConfig {
            requests_per_minute: env_or("RATE_LIMIT_PER_MINUTE", "60")?,
            burst_size: env_or("RATE_LIMIT_BURST", "10")?,
            trust_proxy_headers: env_or("TRUST_PROXY_HEADERS", "false")?,
        };

        let cors = CorsConfig::from_list(
            &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        );

        let config = Config {
            server,
            database,
            cache,
            url,
            auth,
            rate_limit,
            cors,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate every section, reporting the first failure
    pub fn validate(&self) -> AppResult<()> {
        self.database
            .validate()
            .and_then(|_| self.cache.validate())
            .and_then(|_| self.url.validate())
            .and_then(|_| self.auth.validate())
            .and_then(|_| self.rate_limit.validate())
            .and_then(|_| self.cors.validate())
            .map_err(AppError::Configuration)
    }
}
