//! Administrative command handlers.
//!
//! CLI commands for running migrations, viewing statistics, checking the
//! cache server and provisioning user accounts.

use crate::auth::hash_password;
use crate::cache::Cache;
use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, Role};
use crate::store::UserStore;
use clap::Subcommand;
use tracing::info;

/// Administrative commands available via CLI.
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Run database migrations
    Migrate,

    /// Show statistics
    Stats,

    /// Ping the cache server
    PingCache,

    /// Create a user account
    CreateUser {
        username: String,
        password: String,

        /// USER or ADMIN
        #[arg(long, default_value = "USER")]
        role: String,
    },
}

/// Run an administrative command with the given configuration.
pub async fn run(config: Config, admin_command: AdminCommands) -> AppResult<()> {
    match admin_command {
        AdminCommands::Migrate => migrate(config).await,
        AdminCommands::Stats => stats(config).await,
        AdminCommands::PingCache => ping_cache(config).await,
        AdminCommands::CreateUser {
            username,
            password,
            role,
        } => create_user(config, username, password, &role).await,
    }
}

async fn connect(config: &Config) -> AppResult<Repository> {
    Repository::new(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
        config.database.acquire_timeout_seconds,
    )
    .await
}

/// Run database migrations.
async fn migrate(config: Config) -> AppResult<()> {
    info!("Running database migrations...");

    connect(&config).await?.run_migrations().await?;

    info!("Migrations completed successfully");
    Ok(())
}

/// Show link, click and user totals.
async fn stats(config: Config) -> AppResult<()> {
    let stats = connect(&config).await?.get_stats().await?;

    info!("clipurl statistics:");
    info!("  Short links:  {}", stats.total_urls);
    info!("  Clicks:       {}", stats.total_clicks);
    info!("  Users:        {}", stats.total_users);
    Ok(())
}

/// Ping the cache server.
async fn ping_cache(config: Config) -> AppResult<()> {
    if !config.cache.enabled {
        info!("Cache is disabled (CACHE_ENABLED=false)");
        return Ok(());
    }

    info!("Pinging cache server...");
    let cache = Cache::new(
        &config.cache.url,
        config.cache.max_connections,
        config.cache.default_ttl_seconds,
    )
    .await?;

    let response = cache.ping().await?;
    info!("Cache server responded: {}", response);
    Ok(())
}

async fn create_user(
    config: Config,
    username: String,
    password: String,
    role: &str,
) -> AppResult<()> {
    let role = Role::parse(role)
        .ok_or_else(|| AppError::Validation(format!("Unknown role: {}", role)))?;

    if username.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Username and password must not be empty".to_string(),
        ));
    }

    let repository = connect(&config).await?;
    let user = repository
        .create_user(NewUser {
            username,
            password_hash: hash_password(&password)?,
            role,
        })
        .await?;

    info!("Created user {} (id {}, role {})", user.username, user.id, user.role);
    Ok(())
}
