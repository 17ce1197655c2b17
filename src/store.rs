//! Storage ports consumed by the shortening, redirect and analytics services.
//!
//! Implementations:
//! - [`crate::db::Repository`] - PostgreSQL
//! - [`memory::InMemoryStore`] - process-local, used by tests and demos
//! - [`cached::CachedMappingStore`] - Redis read-through in front of another mapping store

pub mod cached;
pub mod memory;

use crate::error::AppResult;
use crate::models::{ClickEvent, NewClickEvent, NewUrlMapping, NewUser, UrlMapping, User};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};

/// System of record for short code to URL associations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Atomically insert the mapping unless its short code is already taken.
    ///
    /// Returns `Ok(None)` on a uniqueness conflict. At most one caller can
    /// ever observe `Some` for a given code.
    async fn insert_if_absent(&self, mapping: NewUrlMapping) -> AppResult<Option<UrlMapping>>;

    async fn find_by_code(&self, short_code: &str) -> AppResult<Option<UrlMapping>>;

    /// All mappings owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: i64) -> AppResult<Vec<UrlMapping>>;

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Append-only log of resolutions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickEventStore: Send + Sync {
    async fn append(&self, click: NewClickEvent) -> AppResult<()>;

    /// Events for `short_code` with `start <= clicked_at <= end`, oldest first.
    async fn query(
        &self,
        short_code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ClickEvent>>;

    /// Click counts per UTC calendar day over every code owned by `owner_id`.
    /// Days without clicks are absent from the result.
    async fn aggregate_by_owner_and_date(
        &self,
        owner_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<BTreeMap<NaiveDate, i64>>;

    /// Lifetime click totals keyed by short code, for codes with at least one click.
    async fn count_by_owner(&self, owner_id: i64) -> AppResult<HashMap<String, i64>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Fails with `UserExists` when the username is taken.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
}
