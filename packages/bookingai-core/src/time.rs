//! Time helpers for message timestamps.
//!
//! Timestamps are UTC and serialize as RFC 3339 / ISO-8601 strings, which is
//! the format the stored transcript uses.
use chrono::{DateTime, Utc};

/// Returns the current time in UTC.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Formats a timestamp as `HH:MM` for chat bubbles.
pub fn format_clock(ts: &DateTime<Utc>) -> String {
    ts.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_is_recent() {
        // After 2024-01-01
        assert!(now().timestamp() > 1_704_067_200);
    }

    #[test]
    fn test_format_clock() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 5, 30).unwrap();
        assert_eq!(format_clock(&ts), "09:05");
    }
}
