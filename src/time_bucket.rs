//! Calendar period keys
//!
//! Periodic challenges are keyed by the period they belong to:
//! - Day buckets: "YYYY-MM-DD"
//! - Week buckets: "YYYY-Www" (ISO week)

use chrono::{DateTime, Datelike, Utc};

/// Compute the day bucket for an instant.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use lingo_progress::time_bucket::day_bucket;
///
/// let ts = Utc.with_ymd_and_hms(2023, 12, 28, 12, 34, 56).unwrap();
/// assert_eq!(day_bucket(ts), "2023-12-28");
/// ```
pub fn day_bucket(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}-{:02}", at.year(), at.month(), at.day())
}

/// Compute the ISO week bucket for an instant.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use lingo_progress::time_bucket::week_bucket;
///
/// let ts = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
/// assert_eq!(week_bucket(ts), "2024-W01");
/// ```
pub fn week_bucket(at: DateTime<Utc>) -> String {
    let week = at.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

/// Milliseconds since epoch, the storage representation for timestamps
pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Inverse of [`to_millis`]. Out-of-range values yield `None`.
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_bucket() {
        let ts = Utc.with_ymd_and_hms(2023, 12, 28, 23, 59, 59).unwrap();
        assert_eq!(day_bucket(ts), "2023-12-28");
    }

    #[test]
    fn test_week_bucket_uses_iso_year() {
        // Dec 31 2024 falls in ISO week 1 of 2025
        let ts = Utc.with_ymd_and_hms(2024, 12, 31, 10, 0, 0).unwrap();
        assert_eq!(week_bucket(ts), "2025-W01");

        let ts = Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();
        assert_eq!(week_bucket(ts), "2026-W43");
    }

    #[test]
    fn test_millis_roundtrip() {
        let ts = Utc.with_ymd_and_hms(2023, 12, 28, 12, 0, 0).unwrap();
        assert_eq!(from_millis(to_millis(ts)), Some(ts));
    }
}
