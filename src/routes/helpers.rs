use crate::auth::Claims;
use crate::error::{AppError, AppResult};
use crate::models::User;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::AppState;

/// `2024-12-01T00:00:00`
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// `2024-12-01`
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Resolve the authenticated principal to an active user record
pub(crate) async fn current_user(state: &AppState, claims: &Claims) -> AppResult<User> {
    let user = state
        .users
        .find_by_username(&claims.username)
        .await?
        .ok_or_else(|| AppError::UserNotFound(claims.username.clone()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("User account is inactive".to_string()));
    }

    Ok(user)
}

/// Parse an ISO local date-time, read as UTC
pub(crate) fn parse_date_time(field: &str, value: &str) -> AppResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), DATE_TIME_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|_| {
            AppError::Validation(format!(
                "{} must be an ISO date-time like 2024-12-01T00:00:00, got '{}'",
                field, value
            ))
        })
}

/// Parse an ISO calendar date
pub(crate) fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        AppError::Validation(format!(
            "{} must be an ISO date like 2024-12-01, got '{}'",
            field, value
        ))
    })
}
