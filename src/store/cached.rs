use crate::cache::Cache;
use crate::error::AppResult;
use crate::models::{NewUrlMapping, UrlMapping};
use crate::store::MappingStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Read-through Redis cache in front of a mapping store.
///
/// Only successful lookups are cached. Cache failures degrade to the inner
/// store and are never surfaced to the caller.
pub struct CachedMappingStore {
    inner: Arc<dyn MappingStore>,
    cache: Cache,
}

impl CachedMappingStore {
    pub fn new(inner: Arc<dyn MappingStore>, cache: Cache) -> Self {
        Self { inner, cache }
    }

    async fn remember(&self, mapping: &UrlMapping) {
        if let Err(e) = self.cache.set_mapping(mapping).await {
            warn!(short_code = %mapping.short_code, "Failed to cache mapping: {}", e);
        }
    }
}

#[async_trait]
impl MappingStore for CachedMappingStore {
    async fn insert_if_absent(&self, mapping: NewUrlMapping) -> AppResult<Option<UrlMapping>> {
        let stored = self.inner.insert_if_absent(mapping).await?;
        if let Some(mapping) = &stored {
            self.remember(mapping).await;
        }
        Ok(stored)
    }

    async fn find_by_code(&self, short_code: &str) -> AppResult<Option<UrlMapping>> {
        match self.cache.get_mapping(short_code).await {
            Ok(Some(mapping)) => return Ok(Some(mapping)),
            Ok(None) => {}
            Err(e) => warn!(short_code, "Cache lookup failed, using store: {}", e),
        }

        let found = self.inner.find_by_code(short_code).await?;
        if let Some(mapping) = &found {
            self.remember(mapping).await;
        }
        Ok(found)
    }

    async fn list_by_owner(&self, owner_id: i64) -> AppResult<Vec<UrlMapping>> {
        self.inner.list_by_owner(owner_id).await
    }

    async fn ping(&self) -> AppResult<()> {
        self.inner.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    // Nothing listens on port 1; deadpool only connects on first use.
    async fn unreachable_cache() -> Cache {
        Cache::new("redis://127.0.0.1:1", 1, 60).await.unwrap()
    }

    fn new_mapping(code: &str) -> NewUrlMapping {
        NewUrlMapping {
            short_code: code.to_string(),
            original_url: "https://example.com".to_string(),
            owner_id: 7,
        }
    }

    #[tokio::test]
    async fn test_insert_succeeds_when_cache_is_down() {
        let inner = Arc::new(InMemoryStore::new());
        let store = CachedMappingStore::new(inner.clone(), unreachable_cache().await);

        let stored = store.insert_if_absent(new_mapping("RLUSAPNi")).await.unwrap();
        assert_eq!(stored.map(|m| m.short_code), Some("RLUSAPNi".to_string()));
        assert_eq!(inner.mapping_count(), 1);

        // Uniqueness still comes from the inner store
        assert!(store.insert_if_absent(new_mapping("RLUSAPNi")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_falls_back_to_inner_store() {
        let inner = Arc::new(InMemoryStore::new());
        let stored = inner.insert_if_absent(new_mapping("RLUSAPNi")).await.unwrap();
        let store = CachedMappingStore::new(inner, unreachable_cache().await);

        let found = store.find_by_code("RLUSAPNi").await.unwrap();
        assert_eq!(found, stored);

        assert!(store.find_by_code("Missing1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listing_and_ping_bypass_cache() {
        let inner = Arc::new(InMemoryStore::new());
        inner.insert_if_absent(new_mapping("RLUSAPNi")).await.unwrap();
        let store = CachedMappingStore::new(inner, unreachable_cache().await);

        assert_eq!(store.list_by_owner(7).await.unwrap().len(), 1);
        assert!(store.ping().await.is_ok());
    }
}
