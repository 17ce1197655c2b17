use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Persisted association between a short code and its original URL
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UrlMapping {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Candidate mapping handed to `MappingStore::insert_if_absent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrlMapping {
    pub short_code: String,
    pub original_url: String,
    pub owner_id: i64,
}

/// One successful resolution of a short code
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: i64,
    pub short_code: String,
    pub clicked_at: DateTime<Utc>,
    pub referrer: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Request metadata attached to a click. None of it is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickMetadata {
    pub referrer: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClickEvent {
    pub short_code: String,
    pub clicked_at: DateTime<Utc>,
    pub metadata: ClickMetadata,
}

/// User account. Only `id` leaks into the core, as the owner key.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The stored role. An unrecognised value grants nothing.
    pub fn role(&self) -> AppResult<Role> {
        Role::parse(&self.role).ok_or_else(|| {
            AppError::Forbidden(format!("Unrecognised role '{}' for {}", self.role, self.username))
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Account roles. `Admin` grants everything `User` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().trim_start_matches("ROLE_") {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn grants(&self, required: Role) -> bool {
        matches!((self, required), (Role::Admin, _) | (Role::User, Role::User))
    }
}

/// Request to shorten a URL
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub original_url: String,
}

/// Short URL as returned to its owner
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlMappingDto {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub short_url: String,
    pub click_count: i64,
    pub created_date: DateTime<Utc>,
    pub username: String,
}

impl UrlMappingDto {
    pub fn new(mapping: UrlMapping, base_url: &str, click_count: i64, username: &str) -> Self {
        let short_url = format!("{}/{}", base_url.trim_end_matches('/'), mapping.short_code);
        UrlMappingDto {
            id: mapping.id,
            original_url: mapping.original_url,
            short_code: mapping.short_code,
            short_url,
            click_count,
            created_date: mapping.created_at,
            username: username.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEventDto {
    pub id: i64,
    pub short_code: String,
    pub clicked_at: DateTime<Utc>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

impl From<ClickEvent> for ClickEventDto {
    fn from(event: ClickEvent) -> Self {
        ClickEventDto {
            id: event.id,
            short_code: event.short_code,
            clicked_at: event.clicked_at,
            referrer: event.referrer,
            user_agent: event.user_agent,
        }
    }
}
