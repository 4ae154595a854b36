//! Pure display aggregates over recording lists
//!
//! No I/O and no clock reads; the same formatting rules serve the per-user
//! profile view and the admin per-account view.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::store::RecordingRecord;

/// Count of distinct calendar dates among the records' timestamps.
pub fn days_used(records: &[RecordingRecord]) -> usize {
    records
        .iter()
        .map(|r| r.timestamp.date_naive())
        .collect::<HashSet<_>>()
        .len()
}

/// Sum of all recording durations.
pub fn total_duration_millis(records: &[RecordingRecord]) -> u64 {
    records.iter().map(|r| r.duration_millis).sum()
}

/// Most recent timestamp, or `None` for an empty list.
pub fn last_used(records: &[RecordingRecord]) -> Option<DateTime<Utc>> {
    records.iter().map(|r| r.timestamp).max()
}

/// Hours/minutes display for a total duration. Hours are omitted when zero;
/// an empty total reads "0 min".
pub fn format_total_duration(millis: u64) -> String {
    let total_minutes = millis / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{} hr", hours));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!("{} min", minutes));
    }
    parts.join(" ")
}

/// `M:SS` clock display for a single recording's length or playhead.
pub fn format_clock(millis: u64) -> String {
    let total_seconds = millis / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: &str, timestamp: DateTime<Utc>, duration_millis: u64) -> RecordingRecord {
        RecordingRecord::new_local(id, "/tmp/a.wav", "Recording", timestamp, duration_millis)
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn days_used_counts_distinct_dates() {
        // Same day, different times: one day.
        let records = vec![
            record("1", at(2025, 10, 25, 1, 30), 1000),
            record("2", at(2025, 10, 25, 23, 0), 1000),
        ];
        assert_eq!(days_used(&records), 1);

        let records = vec![
            record("1", at(2025, 10, 25, 1, 30), 1000),
            record("2", at(2025, 10, 26, 1, 30), 1000),
        ];
        assert_eq!(days_used(&records), 2);
    }

    #[test]
    fn days_used_empty_is_zero() {
        assert_eq!(days_used(&[]), 0);
    }

    #[test]
    fn total_duration_sums() {
        let records = vec![
            record("1", at(2025, 10, 25, 1, 0), 65_000),
            record("2", at(2025, 10, 26, 1, 0), 5_000),
        ];
        assert_eq!(total_duration_millis(&records), 70_000);
    }

    #[test]
    fn last_used_is_max_timestamp() {
        let records = vec![
            record("1", at(2025, 10, 25, 1, 0), 0),
            record("2", at(2025, 11, 1, 6, 0), 0),
            record("3", at(2025, 10, 30, 1, 0), 0),
        ];
        assert_eq!(last_used(&records), Some(at(2025, 11, 1, 6, 0)));
        assert_eq!(last_used(&[]), None);
    }

    #[test]
    fn total_duration_formatting() {
        assert_eq!(format_total_duration(0), "0 min");
        assert_eq!(format_total_duration(5 * 60_000), "5 min");
        assert_eq!(format_total_duration(60 * 60_000), "1 hr");
        assert_eq!(format_total_duration(125 * 60_000), "2 hr 5 min");
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65_000), "1:05");
        assert_eq!(format_clock(600_000), "10:00");
    }
}
