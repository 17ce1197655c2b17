use serde::Deserialize;

/// Per-client request budget for the API routes
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_minute: u64,
    pub burst_size: u32,
    /// Key anonymous clients on `X-Forwarded-For`/`X-Real-IP`. Only safe
    /// behind a proxy that overwrites those headers; otherwise the peer
    /// address is used.
    pub trust_proxy_headers: bool,
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<(), String> {
        // The governor replenishes one token every 60000 / rpm milliseconds.
        if self.requests_per_minute == 0 || self.requests_per_minute > 60_000 {
            return Err("RATE_LIMIT_PER_MINUTE must be between 1 and 60000".to_string());
        }

        if self.burst_size == 0 {
            return Err("RATE_LIMIT_BURST must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Milliseconds between token replenishments
    pub fn replenish_interval_ms(&self) -> u64 {
        (60_000 / self.requests_per_minute).max(1)
    }
}
