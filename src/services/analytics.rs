use crate::error::AppResult;
use crate::models::ClickEvent;
use crate::store::ClickEventStore;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read-side queries over the click event log.
///
/// Ownership of the queried codes is checked by the caller.
#[derive(Clone)]
pub struct AnalyticsService {
    clicks: Arc<dyn ClickEventStore>,
}

impl AnalyticsService {
    pub fn new(clicks: Arc<dyn ClickEventStore>) -> Self {
        Self { clicks }
    }

    /// Every click on `short_code` with `start <= clicked_at <= end`, oldest first.
    ///
    /// An inverted range yields an empty list rather than an error.
    pub async fn events_for_code_in_range(
        &self,
        short_code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ClickEvent>> {
        if end < start {
            return Ok(Vec::new());
        }
        self.clicks.query(short_code, start, end).await
    }

    /// Clicks per UTC calendar day over all codes owned by `owner_id`, for
    /// days in `[start, end]`.
    ///
    /// Days with no clicks are omitted from the map.
    pub async fn total_clicks_by_user_and_date(
        &self,
        owner_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<BTreeMap<NaiveDate, i64>> {
        if end < start {
            return Ok(BTreeMap::new());
        }
        let mut totals = self
            .clicks
            .aggregate_by_owner_and_date(owner_id, start, end)
            .await?;
        totals.retain(|_, count| *count > 0);
        Ok(totals)
    }
}
