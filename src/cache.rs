use crate::error::{AppError, AppResult};
use crate::models::UrlMapping;
use deadpool_redis::{redis::AsyncCommands, Manager, Pool, Runtime};
use std::time::Duration;

/// Redis cache for mapping lookups on the redirect path
#[derive(Clone)]
pub struct Cache {
    pool: Pool,
    default_ttl: Duration,
}

impl Cache {
    /// Create a new cache connection pool
    pub async fn new(redis_url: &str, max_connections: u32, default_ttl_seconds: u64) -> AppResult<Self> {
        let manager = Manager::new(redis_url)
            .map_err(|e| AppError::Configuration(format!("Invalid Redis URL: {}", e)))?;

        let pool = Pool::builder(manager)
            .max_size(max_connections as usize)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create Redis pool: {}", e)))?;

        Ok(Self {
            pool,
            default_ttl: Duration::from_secs(default_ttl_seconds),
        })
    }

    /// Ping the Redis server to check connectivity
    pub async fn ping(&self) -> AppResult<String> {
        let mut conn = self.pool.get().await?;
        let response: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut conn)
            .await?;
        Ok(response)
    }

    /// Get a mapping from cache by short code
    pub async fn get_mapping(&self, short_code: &str) -> AppResult<Option<UrlMapping>> {
        let key = Self::mapping_key(short_code);
        let mut conn = self.pool.get().await?;

        let value: Option<String> = conn.get(&key).await?;

        match value {
            Some(v) => {
                let mapping: UrlMapping = serde_json::from_str(&v)?;
                Ok(Some(mapping))
            }
            None => Ok(None),
        }
    }

    /// Store a mapping. Mappings never change, so the TTL only bounds memory.
    pub async fn set_mapping(&self, mapping: &UrlMapping) -> AppResult<()> {
        let key = Self::mapping_key(&mapping.short_code);
        let value = serde_json::to_string(mapping)?;
        let mut conn = self.pool.get().await?;

        conn.set_ex::<_, _, ()>(&key, value, self.default_ttl.as_secs())
            .await?;

        Ok(())
    }

    fn mapping_key(short_code: &str) -> String {
        format!("{}:{}", Self::KEY_PREFIX, short_code)
    }

    const KEY_PREFIX: &'static str = "mapping";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_key_generation() {
        assert_eq!(Cache::mapping_key("abc123"), "mapping:abc123");
        assert_eq!(Cache::mapping_key("test"), "mapping:test");
    }
}
