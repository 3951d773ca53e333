//! ISO-8601 timestamp parsing
//!
//! Accepts the shapes that upstream sources actually emit: RFC 3339 with an
//! offset or a trailing `Z`, naive date-times (interpreted as UTC), and bare
//! dates (midnight UTC).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{Result, UnisyncError};

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp into UTC
///
/// A trailing `Z` is normalized to `+00:00` before parsing. Values without an
/// offset are taken to be UTC.
pub fn parse_iso8601(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    let normalized = match trimmed.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => trimmed.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(UnisyncError::InvalidTimestamp(input.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_parse_naive_as_utc() {
        let ts = parse_iso8601("2024-01-01T00:00:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_trailing_z() {
        let ts = parse_iso8601("2024-03-10T12:34:56.789Z").unwrap();
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.nanosecond(), 789_000_000);
    }

    #[test]
    fn test_parse_explicit_offset() {
        let ts = parse_iso8601("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_space_separator_and_date_only() {
        assert_eq!(
            parse_iso8601("2024-05-06 07:08:09").unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
        );
        assert_eq!(
            parse_iso8601("2024-05-06").unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_iso8601("yesterday").is_err());
        assert!(parse_iso8601("").is_err());
        assert!(parse_iso8601("2024-13-01T00:00:00").is_err());
    }
}
