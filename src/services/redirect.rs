use crate::error::{AppError, AppResult};
use crate::models::{ClickMetadata, NewClickEvent};
use crate::services::short_code::ShortCodeGenerator;
use crate::store::{ClickEventStore, MappingStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves short codes to their targets and records each visit.
#[derive(Clone)]
pub struct RedirectService {
    mappings: Arc<dyn MappingStore>,
    clicks: Arc<dyn ClickEventStore>,
    generator: ShortCodeGenerator,
}

impl RedirectService {
    pub fn new(
        mappings: Arc<dyn MappingStore>,
        clicks: Arc<dyn ClickEventStore>,
        generator: ShortCodeGenerator,
    ) -> Self {
        Self {
            mappings,
            clicks,
            generator,
        }
    }

    /// Look up `short_code` and append a click event for it.
    ///
    /// The click append is best-effort: if it fails the redirect target is
    /// still returned and the lost click is logged.
    pub async fn resolve(&self, short_code: &str, metadata: ClickMetadata) -> AppResult<String> {
        if !self.generator.is_well_formed(short_code) {
            debug!(short_code, "Rejected malformed short code");
            return Err(AppError::UnknownCode(short_code.to_string()));
        }

        let mapping = self
            .mappings
            .find_by_code(short_code)
            .await?
            .ok_or_else(|| AppError::UnknownCode(short_code.to_string()))?;

        let click = NewClickEvent {
            short_code: mapping.short_code,
            clicked_at: Utc::now(),
            metadata,
        };
        if let Err(e) = self.clicks.append(click).await {
            warn!(short_code, "Failed to record click event: {}", e);
        }

        Ok(mapping.original_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUrlMapping, UrlMapping};
    use crate::store::memory::InMemoryStore;
    use crate::store::{MockClickEventStore, MockMappingStore};
    use chrono::{Duration, TimeZone};

    async fn seeded_store(code: &str, url: &str) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_if_absent(NewUrlMapping {
                short_code: code.to_string(),
                original_url: url.to_string(),
                owner_id: 1,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_resolve_returns_target_and_records_click() {
        let store = seeded_store("RLUSAPNi", "https://example.com").await;
        let service = RedirectService::new(store.clone(), store.clone(), ShortCodeGenerator::new(8));

        let metadata = ClickMetadata {
            referrer: Some("https://news.example".to_string()),
            ip_address: Some("10.0.0.1".to_string()),
            user_agent: None,
        };
        let target = service.resolve("RLUSAPNi", metadata).await.unwrap();
        assert_eq!(target, "https://example.com");

        let now = Utc::now();
        let events = store
            .query("RLUSAPNi", now - Duration::minutes(1), now + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].referrer.as_deref(), Some("https://news.example"));
    }

    #[tokio::test]
    async fn test_resolve_unknown_code() {
        let store = Arc::new(InMemoryStore::new());
        let service = RedirectService::new(store.clone(), store.clone(), ShortCodeGenerator::new(8));

        let err = service.resolve("zzzzzzzz", ClickMetadata::default()).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownCode(code) if code == "zzzzzzzz"));
        assert_eq!(store.click_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_codes_survive_a_length_change() {
        let store = seeded_store("RLUSAPNi", "https://example.com").await;
        let service =
            RedirectService::new(store.clone(), store.clone(), ShortCodeGenerator::new(10));

        let target = service.resolve("RLUSAPNi", ClickMetadata::default()).await.unwrap();
        assert_eq!(target, "https://example.com");
        assert_eq!(store.click_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_malformed_code_skips_store() {
        // No expectations: any store call would panic.
        let service = RedirectService::new(
            Arc::new(MockMappingStore::new()),
            Arc::new(MockClickEventStore::new()),
            ShortCodeGenerator::new(8),
        );

        for code in ["", "abc", "abc$1234", "favicon.ico", "abcdefghijklmnopq"] {
            let err = service.resolve(code, ClickMetadata::default()).await.unwrap_err();
            assert!(matches!(err, AppError::UnknownCode(_)));
        }
    }

    #[tokio::test]
    async fn test_lost_click_still_redirects() {
        let mut mappings = MockMappingStore::new();
        mappings.expect_find_by_code().returning(|code| {
            Ok(Some(UrlMapping {
                id: 1,
                short_code: code.to_string(),
                original_url: "https://example.com".to_string(),
                owner_id: 1,
                created_at: Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap(),
            }))
        });
        let mut clicks = MockClickEventStore::new();
        clicks
            .expect_append()
            .times(1)
            .returning(|_| Err(AppError::StoreUnavailable("connection reset".into())));

        let service =
            RedirectService::new(Arc::new(mappings), Arc::new(clicks), ShortCodeGenerator::new(8));

        let target = service.resolve("abcd1234", ClickMetadata::default()).await.unwrap();
        assert_eq!(target, "https://example.com");
    }

    #[tokio::test]
    async fn test_lookup_failure_is_surfaced() {
        let mut mappings = MockMappingStore::new();
        mappings
            .expect_find_by_code()
            .returning(|_| Err(AppError::StoreUnavailable("pool timed out".into())));

        let service = RedirectService::new(
            Arc::new(mappings),
            Arc::new(MockClickEventStore::new()),
            ShortCodeGenerator::new(8),
        );

        let err = service.resolve("abcd1234", ClickMetadata::default()).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }
}
