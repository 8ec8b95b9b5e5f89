//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp, truncated to whole microseconds
///
/// Stored timestamps round-trip through TEXT columns, so values handed to
/// the database never carry sub-microsecond precision.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

/// Human-readable timestamp used in rendered tables
pub fn display(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[test]
    fn test_now_has_no_sub_microsecond_part() {
        let timestamp = now();
        assert_eq!(timestamp.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_display_format() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(display(&ts), "2023-11-14 22:13 UTC");
    }
}
