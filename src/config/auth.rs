use serde::Deserialize;

/// Signing settings for the bearer tokens issued at login
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret
    pub jwt_secret: String,

    /// Token lifetime in hours
    pub jwt_expiration_hours: i64,
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters for security".to_string());
        }

        if !(1..=24 * 30).contains(&self.jwt_expiration_hours) {
            return Err("JWT_EXPIRATION_HOURS must be between 1 and 720".to_string());
        }

        Ok(())
    }
}
