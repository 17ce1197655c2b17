use crate::error::{AppError, AppResult};
use crate::models::{ClickEvent, NewClickEvent, NewUrlMapping, NewUser, UrlMapping, User};
use crate::store::{ClickEventStore, MappingStore, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

/// Process-local store implementing every storage port.
///
/// Code uniqueness comes from the `DashMap` entry API, which holds the shard
/// lock between the presence check and the insert.
#[derive(Default)]
pub struct InMemoryStore {
    mappings: DashMap<String, UrlMapping>,
    clicks: RwLock<Vec<ClickEvent>>,
    users: DashMap<String, User>,
    next_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn owner_of(&self, short_code: &str) -> Option<i64> {
        self.mappings.get(short_code).map(|m| m.owner_id)
    }

    pub fn mapping_count(&self) -> usize {
        self.mappings.len()
    }

    pub fn click_count(&self) -> AppResult<usize> {
        let clicks = self
            .clicks
            .read()
            .map_err(|_| AppError::Internal("click log lock poisoned".into()))?;
        Ok(clicks.len())
    }
}

#[async_trait]
impl MappingStore for InMemoryStore {
    async fn insert_if_absent(&self, mapping: NewUrlMapping) -> AppResult<Option<UrlMapping>> {
        match self.mappings.entry(mapping.short_code.clone()) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                let stored = UrlMapping {
                    id: self.next_id(),
                    short_code: mapping.short_code,
                    original_url: mapping.original_url,
                    owner_id: mapping.owner_id,
                    created_at: Utc::now(),
                };
                slot.insert(stored.clone());
                Ok(Some(stored))
            }
        }
    }

    async fn find_by_code(&self, short_code: &str) -> AppResult<Option<UrlMapping>> {
        Ok(self.mappings.get(short_code).map(|m| m.clone()))
    }

    async fn list_by_owner(&self, owner_id: i64) -> AppResult<Vec<UrlMapping>> {
        let mut owned: Vec<UrlMapping> = self
            .mappings
            .iter()
            .filter(|m| m.owner_id == owner_id)
            .map(|m| m.clone())
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }
}

#[async_trait]
impl ClickEventStore for InMemoryStore {
    async fn append(&self, click: NewClickEvent) -> AppResult<()> {
        let event = ClickEvent {
            id: self.next_id(),
            short_code: click.short_code,
            clicked_at: click.clicked_at,
            referrer: click.metadata.referrer,
            ip_address: click.metadata.ip_address,
            user_agent: click.metadata.user_agent,
        };
        self.clicks
            .write()
            .map_err(|_| AppError::Internal("click log lock poisoned".into()))?
            .push(event);
        Ok(())
    }

    async fn query(
        &self,
        short_code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ClickEvent>> {
        let clicks = self
            .clicks
            .read()
            .map_err(|_| AppError::Internal("click log lock poisoned".into()))?;
        let mut events: Vec<ClickEvent> = clicks
            .iter()
            .filter(|e| e.short_code == short_code && e.clicked_at >= start && e.clicked_at <= end)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.clicked_at.cmp(&b.clicked_at).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn aggregate_by_owner_and_date(
        &self,
        owner_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<BTreeMap<NaiveDate, i64>> {
        let clicks = self
            .clicks
            .read()
            .map_err(|_| AppError::Internal("click log lock poisoned".into()))?;
        let mut per_day = BTreeMap::new();
        for event in clicks.iter() {
            let day = event.clicked_at.date_naive();
            if day < start || day > end {
                continue;
            }
            if self.owner_of(&event.short_code) == Some(owner_id) {
                *per_day.entry(day).or_insert(0) += 1;
            }
        }
        Ok(per_day)
    }

    async fn count_by_owner(&self, owner_id: i64) -> AppResult<HashMap<String, i64>> {
        let clicks = self
            .clicks
            .read()
            .map_err(|_| AppError::Internal("click log lock poisoned".into()))?;
        let mut totals = HashMap::new();
        for event in clicks.iter() {
            if self.owner_of(&event.short_code) == Some(owner_id) {
                *totals.entry(event.short_code.clone()).or_insert(0) += 1;
            }
        }
        Ok(totals)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.users.get(username).map(|u| u.clone()))
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(AppError::UserExists(user.username)),
            Entry::Vacant(slot) => {
                let created = User {
                    id: self.next_id(),
                    username: user.username,
                    password_hash: user.password_hash,
                    role: user.role.as_str().to_string(),
                    is_active: true,
                    created_at: Utc::now(),
                };
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }
}
