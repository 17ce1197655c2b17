use crate::error::{AppError, AppResult};
use crate::models::{ClickEvent, NewClickEvent, NewUrlMapping, NewUser, UrlMapping, User};
use crate::store::{ClickEventStore, MappingStore, UserStore};
use crate::util::day_bounds;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions, PgPool,
};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::time::Duration;

/// PostgreSQL-backed implementation of every storage port
#[derive(Clone)]
pub struct Repository {
    pub(crate) pool: PgPool,
}

impl Repository {
    /// Create a new repository with a connection pool
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_seconds: u64,
    ) -> AppResult<Self> {
        let options = PgConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Configuration(format!("Invalid database URL: {}", e)))?
            .disable_statement_logging();

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_seconds))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get statistics
    pub async fn get_stats(&self) -> AppResult<Stats> {
        let row = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM url_mappings) AS total_urls,
                (SELECT COUNT(*) FROM click_events) AS total_clicks,
                (SELECT COUNT(*) FROM users) AS total_users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Stats {
            total_urls: row.0,
            total_clicks: row.1,
            total_users: row.2,
        })
    }
}

#[async_trait]
impl MappingStore for Repository {
    async fn insert_if_absent(&self, mapping: NewUrlMapping) -> AppResult<Option<UrlMapping>> {
        let result = sqlx::query_as::<_, UrlMapping>(
            r#"
            INSERT INTO url_mappings (short_code, original_url, owner_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (short_code) DO NOTHING
            RETURNING id, short_code, original_url, owner_id, created_at
            "#,
        )
        .bind(&mapping.short_code)
        .bind(&mapping.original_url)
        .bind(mapping.owner_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_by_code(&self, short_code: &str) -> AppResult<Option<UrlMapping>> {
        let result = sqlx::query_as::<_, UrlMapping>(
            r#"
            SELECT id, short_code, original_url, owner_id, created_at
            FROM url_mappings
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn list_by_owner(&self, owner_id: i64) -> AppResult<Vec<UrlMapping>> {
        let results = sqlx::query_as::<_, UrlMapping>(
            r#"
            SELECT id, short_code, original_url, owner_id, created_at
            FROM url_mappings
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ClickEventStore for Repository {
    async fn append(&self, click: NewClickEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO click_events (short_code, clicked_at, referrer, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&click.short_code)
        .bind(click.clicked_at)
        .bind(&click.metadata.referrer)
        .bind(&click.metadata.ip_address)
        .bind(&click.metadata.user_agent)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query(
        &self,
        short_code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ClickEvent>> {
        let results = sqlx::query_as::<_, ClickEvent>(
            r#"
            SELECT id, short_code, clicked_at, referrer, ip_address, user_agent
            FROM click_events
            WHERE short_code = $1 AND clicked_at >= $2 AND clicked_at <= $3
            ORDER BY clicked_at ASC, id ASC
            "#,
        )
        .bind(short_code)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    async fn aggregate_by_owner_and_date(
        &self,
        owner_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<BTreeMap<NaiveDate, i64>> {
        let (from, until) = day_bounds(start, end);

        let rows = sqlx::query_as::<_, (NaiveDate, i64)>(
            r#"
            SELECT (c.clicked_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS clicks
            FROM click_events c
            JOIN url_mappings m ON m.short_code = c.short_code
            WHERE m.owner_id = $1 AND c.clicked_at >= $2 AND c.clicked_at < $3
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(owner_id)
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn count_by_owner(&self, owner_id: i64) -> AppResult<HashMap<String, i64>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT c.short_code, COUNT(*) AS clicks
            FROM click_events c
            JOIN url_mappings m ON m.short_code = c.short_code
            WHERE m.owner_id = $1
            GROUP BY c.short_code
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}

#[async_trait]
impl UserStore for Repository {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role, is_active, created_at
            FROM users WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, password_hash, role, is_active, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        result.ok_or(AppError::UserExists(user.username))
    }
}

/// Statistics struct
#[derive(Debug)]
pub struct Stats {
    pub total_urls: i64,
    pub total_clicks: i64,
    pub total_users: i64,
}
