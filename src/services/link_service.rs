use crate::config::UrlConfig;
use crate::error::{AppError, AppResult};
use crate::models::{NewUrlMapping, UrlMapping};
use crate::services::short_code::ShortCodeGenerator;
use crate::store::{ClickEventStore, MappingStore};
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

/// Creates short links and lists them for their owner.
#[derive(Clone)]
pub struct LinkService {
    mappings: Arc<dyn MappingStore>,
    clicks: Arc<dyn ClickEventStore>,
    generator: ShortCodeGenerator,
    max_attempts: u32,
    strict_url_validation: bool,
}

impl LinkService {
    pub fn new(
        mappings: Arc<dyn MappingStore>,
        clicks: Arc<dyn ClickEventStore>,
        config: &UrlConfig,
    ) -> Self {
        Self {
            mappings,
            clicks,
            generator: ShortCodeGenerator::new(config.short_code_length),
            max_attempts: config.short_code_max_attempts,
            strict_url_validation: config.strict_url_validation,
        }
    }

    /// Allocate a fresh short code for `original_url` and persist the mapping.
    ///
    /// # Errors
    ///
    /// - `AppError::InvalidUrl` if the input is not an acceptable absolute URL
    /// - `AppError::CodeSpaceExhausted` if every attempt hit an existing code
    /// - `AppError::StoreUnavailable` if the store cannot be reached
    pub async fn shorten(&self, original_url: &str, owner_id: i64) -> AppResult<UrlMapping> {
        let original_url = validate_url(original_url, self.strict_url_validation)?;

        for attempt in 1..=self.max_attempts {
            let candidate = NewUrlMapping {
                short_code: self.generator.generate(),
                original_url: original_url.to_string(),
                owner_id,
            };
            let short_code = candidate.short_code.clone();

            match self.mappings.insert_if_absent(candidate).await? {
                Some(mapping) => {
                    info!(short_code = %mapping.short_code, owner_id, "Created short URL");
                    return Ok(mapping);
                }
                None => {
                    warn!(
                        short_code = %short_code,
                        attempt,
                        max_attempts = self.max_attempts,
                        "Short code collision, regenerating"
                    );
                }
            }
        }

        error!(
            max_attempts = self.max_attempts,
            code_length = self.generator.length(),
            "Every short code candidate collided; code space may be undersized or the store corrupt"
        );
        Err(AppError::CodeSpaceExhausted(self.max_attempts))
    }

    /// Mappings owned by `owner_id`, newest first, paired with their click totals.
    pub async fn list_for_owner(&self, owner_id: i64) -> AppResult<Vec<(UrlMapping, i64)>> {
        let mappings = self.mappings.list_by_owner(owner_id).await?;
        let counts = self.clicks.count_by_owner(owner_id).await?;

        Ok(mappings
            .into_iter()
            .map(|m| {
                let clicks = counts.get(&m.short_code).copied().unwrap_or(0);
                (m, clicks)
            })
            .collect())
    }
}

/// Check that `input` is an absolute URL and return it trimmed.
///
/// With `strict` set, only `http`/`https` URLs with a host are accepted.
pub fn validate_url(input: &str, strict: bool) -> AppResult<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidUrl("URL must not be empty".to_string()));
    }

    // The parser silently drops tabs, newlines and C0 controls, but the raw
    // string is what gets stored and later sent back in a Location header.
    if trimmed.chars().any(char::is_control) {
        return Err(AppError::InvalidUrl(
            "URL must not contain control characters".to_string(),
        ));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|e| AppError::InvalidUrl(format!("Invalid URL format: {}", e)))?;

    if strict {
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(AppError::InvalidUrl("URL must include a host".to_string()));
        }
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use crate::store::{MockClickEventStore, MockMappingStore};
    use std::collections::HashSet;

    fn url_config() -> UrlConfig {
        UrlConfig {
            short_code_length: 8,
            base_url: "http://localhost:3000".to_string(),
            short_code_max_attempts: 5,
            strict_url_validation: true,
        }
    }

    fn memory_service() -> (LinkService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let service = LinkService::new(store.clone(), store.clone(), &url_config());
        (service, store)
    }

    #[test]
    fn test_validate_url() {
        assert_eq!(validate_url(" https://example.com ", true).unwrap(), "https://example.com");
        assert!(validate_url("http://localhost:3000/path?q=1", true).is_ok());
        assert!(matches!(validate_url("example.com", true), Err(AppError::InvalidUrl(_))));
        assert!(matches!(validate_url("", true), Err(AppError::InvalidUrl(_))));
        assert!(matches!(validate_url("ftp://example.com", true), Err(AppError::InvalidUrl(_))));
        assert!(validate_url("ftp://example.com", false).is_ok());
        assert!(matches!(validate_url("/relative/path", false), Err(AppError::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_url_rejects_control_characters() {
        for input in [
            "https://exa\nmple.com/path",
            "https://example.com/\tpath",
            "\u{1}https://example.com",
            "https://example.com/a\rb",
        ] {
            assert!(
                matches!(validate_url(input, true), Err(AppError::InvalidUrl(_))),
                "{:?} should be rejected",
                input
            );
            assert!(matches!(validate_url(input, false), Err(AppError::InvalidUrl(_))));
        }
    }

    #[tokio::test]
    async fn test_shorten_persists_mapping() {
        let (service, store) = memory_service();

        let mapping = service.shorten("https://example.com", 42).await.unwrap();

        assert_eq!(mapping.short_code.len(), 8);
        assert_eq!(mapping.original_url, "https://example.com");
        assert_eq!(mapping.owner_id, 42);
        assert_eq!(store.find_by_code(&mapping.short_code).await.unwrap(), Some(mapping));
    }

    #[tokio::test]
    async fn test_shorten_rejects_invalid_url_without_writing() {
        let (service, store) = memory_service();

        let err = service.shorten("not a url", 1).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidUrl(_)));
        assert_eq!(store.mapping_count(), 0);
    }

    #[tokio::test]
    async fn test_shorten_retries_after_collision() {
        let mut mappings = MockMappingStore::new();
        let mut seq = mockall::Sequence::new();
        mappings
            .expect_insert_if_absent()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        mappings
            .expect_insert_if_absent()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|m| {
                Ok(Some(UrlMapping {
                    id: 1,
                    short_code: m.short_code,
                    original_url: m.original_url,
                    owner_id: m.owner_id,
                    created_at: chrono::Utc::now(),
                }))
            });

        let service = LinkService::new(
            Arc::new(mappings),
            Arc::new(MockClickEventStore::new()),
            &url_config(),
        );

        let mapping = service.shorten("https://example.com", 1).await.unwrap();
        assert_eq!(mapping.original_url, "https://example.com");
    }

    #[tokio::test]
    async fn test_shorten_gives_up_after_max_attempts() {
        let mut mappings = MockMappingStore::new();
        mappings
            .expect_insert_if_absent()
            .times(5)
            .returning(|_| Ok(None));

        let service = LinkService::new(
            Arc::new(mappings),
            Arc::new(MockClickEventStore::new()),
            &url_config(),
        );

        let err = service.shorten("https://example.com", 1).await.unwrap_err();
        assert!(matches!(err, AppError::CodeSpaceExhausted(5)));
    }

    #[tokio::test]
    async fn test_shorten_surfaces_store_unavailable() {
        let mut mappings = MockMappingStore::new();
        mappings
            .expect_insert_if_absent()
            .times(1)
            .returning(|_| Err(AppError::StoreUnavailable("pool timed out".into())));

        let service = LinkService::new(
            Arc::new(mappings),
            Arc::new(MockClickEventStore::new()),
            &url_config(),
        );

        let err = service.shorten("https://example.com", 1).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_shortening_never_shares_a_code() {
        let (service, store) = memory_service();

        let mut handles = Vec::new();
        for task in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let mut codes = Vec::new();
                for i in 0..250 {
                    let url = format!("https://example.com/{}/{}", task, i);
                    codes.push(service.shorten(&url, task).await.unwrap().short_code);
                }
                codes
            }));
        }

        let mut all = HashSet::new();
        for handle in handles {
            for code in handle.await.unwrap() {
                assert!(all.insert(code), "duplicate short code issued");
            }
        }
        assert_eq!(all.len(), 2_000);
        assert_eq!(store.mapping_count(), 2_000);
    }

    #[tokio::test]
    async fn test_list_for_owner_includes_click_counts() {
        let (service, store) = memory_service();
        let clicked = service.shorten("https://example.com/a", 1).await.unwrap();
        service.shorten("https://example.com/b", 1).await.unwrap();
        service.shorten("https://example.com/c", 2).await.unwrap();

        for _ in 0..3 {
            store
                .append(crate::models::NewClickEvent {
                    short_code: clicked.short_code.clone(),
                    clicked_at: chrono::Utc::now(),
                    metadata: Default::default(),
                })
                .await
                .unwrap();
        }

        let listed = service.list_for_owner(1).await.unwrap();
        assert_eq!(listed.len(), 2);
        for (mapping, clicks) in listed {
            let expected = if mapping.short_code == clicked.short_code { 3 } else { 0 };
            assert_eq!(clicks, expected);
        }
    }
}
