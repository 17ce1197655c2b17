//! Utility functions for general-purpose use across the application.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

/// Convert an inclusive range of calendar days into a half-open UTC instant range.
///
/// # Arguments
///
/// * `start` - First day of the range
/// * `end` - Last day of the range, included
///
/// # Returns
///
/// `(from, until)` where `from` is midnight UTC of `start` and `until` is
/// midnight UTC of the day after `end`. Every instant on `end` satisfies
/// `t < until`.
///
/// # Examples
///
/// ```
/// use clipurl::util::day_bounds;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
/// let (from, until) = day_bounds(day, day);
/// assert_eq!((until - from).num_hours(), 24);
/// ```
pub fn day_bounds(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = start.and_time(NaiveTime::MIN).and_utc();
    let until = end
        .checked_add_days(Days::new(1))
        .map(|next| next.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (from, until)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_bounds_cover_whole_days() {
        let start = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 7).unwrap();
        let (from, until) = day_bounds(start, end);

        assert_eq!(from, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(until, Utc.with_ymd_and_hms(2024, 12, 8, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_day_bounds_last_representable_day() {
        let (_, until) = day_bounds(NaiveDate::MAX, NaiveDate::MAX);
        assert_eq!(until, DateTime::<Utc>::MAX_UTC);
    }
}
