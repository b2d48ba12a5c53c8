//! Shared utility functions for FVI crates.

/// Date utility functions
pub mod dates {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};

    /// ISO-8601 calendar date format used for every output record.
    pub const ISO_FORMAT: &str = "%Y-%m-%d";

    /// Date-only formats accepted from upstream sources, tried in order.
    const DATE_FORMATS: [&str; 3] = [ISO_FORMAT, "%Y%m%d", "%Y/%m/%d"];

    /// Date-time formats whose time component is dropped.
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(ISO_FORMAT).to_string()
    }

    /// Parse a date from any of the representations the data sources emit.
    ///
    /// Accepts plain dates (`2024-01-31`, `20240131`, `2024/01/31`),
    /// date-times with the time discarded, and RFC 3339 timestamps, which are
    /// converted to their UTC calendar date.
    pub fn parse_flexible(s: &str) -> anyhow::Result<NaiveDate> {
        let s = s.trim();
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, format) {
                return Ok(date);
            }
        }
        for format in DATETIME_FORMATS {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(datetime.date());
            }
        }
        if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
            return Ok(datetime.naive_utc().date());
        }
        anyhow::bail!("unrecognised date representation: {s:?}")
    }

    /// Convert epoch milliseconds (the `system:time_start` convention) to a UTC date.
    pub fn date_from_epoch_millis(millis: i64) -> anyhow::Result<NaiveDate> {
        DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| anyhow::anyhow!("epoch milliseconds out of range: {millis}"))
    }

    /// Whole days from `start` to `end` (negative if `end` precedes `start`).
    pub fn days_between(start: &NaiveDate, end: &NaiveDate) -> i64 {
        (*end - *start).num_days()
    }

}
