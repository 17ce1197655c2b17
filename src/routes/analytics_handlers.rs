use crate::auth::Claims;
use crate::error::{AppError, AppResult};
use crate::models::ClickEventDto;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use axum::Extension;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::helpers::{current_user, parse_date, parse_date_time};
use super::types::DateRangeQuery;
use super::AppState;

/// Click events for one of the caller's short URLs
///
/// `GET /api/urls/analytics/{shortUrl}?startDate=2024-12-01T00:00:00&endDate=2024-12-07T23:59:59`
pub async fn url_analytics(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(short_url): Path<String>,
    Query(range): Query<DateRangeQuery>,
) -> AppResult<impl IntoResponse> {
    let start = parse_date_time("startDate", &range.start_date)?;
    let end = parse_date_time("endDate", &range.end_date)?;

    let user = current_user(&state, &claims).await?;

    // Someone else's code is reported exactly like a missing one.
    let owned = state
        .mappings
        .find_by_code(&short_url)
        .await?
        .is_some_and(|m| m.owner_id == user.id);
    if !owned {
        return Err(AppError::UnknownCode(short_url));
    }

    let events: Vec<ClickEventDto> = state
        .analytics
        .events_for_code_in_range(&short_url, start, end)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(events))
}

/// Clicks per day across all of the caller's short URLs
///
/// `GET /api/urls/totalClicks?startDate=2024-12-01&endDate=2024-12-07`
pub async fn total_clicks(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Query(range): Query<DateRangeQuery>,
) -> AppResult<impl IntoResponse> {
    let start = parse_date("startDate", &range.start_date)?;
    let end = parse_date("endDate", &range.end_date)?;

    let user = current_user(&state, &claims).await?;

    let totals: BTreeMap<String, i64> = state
        .analytics
        .total_clicks_by_user_and_date(user.id, start, end)
        .await?
        .into_iter()
        .map(|(day, count)| (day.format("%Y-%m-%d").to_string(), count))
        .collect();

    Ok(Json(totals))
}
