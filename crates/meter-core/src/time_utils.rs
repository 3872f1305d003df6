use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{MeterError, Result};

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Timezone-aware timestamp parsing and calendar-day bucketing.
///
/// Meter readings are stored as UTC instants, but consumption is reported
/// per local calendar day, so every day boundary goes through this handler.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneHandler {
    default_tz: Tz,
}

impl Default for TimezoneHandler {
    fn default() -> Self {
        Self { default_tz: Tz::UTC }
    }
}

impl TimezoneHandler {
    /// Create a handler with the given IANA timezone name as the default.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { default_tz: tz }
    }

    /// Parse an ISO 8601 / RFC 3339 timestamp string into a UTC [`DateTime`].
    ///
    /// Offset-less timestamps are interpreted in the handler's timezone.
    /// Returns `None` for empty strings, unrecognised formats, and local times
    /// that do not exist or are ambiguous (DST transitions).
    pub fn parse_timestamp(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Utc));
        }

        const FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];
        for fmt in FMTS {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                use chrono::TimeZone as _;
                if let chrono::LocalResult::Single(dt) = self.default_tz.from_local_datetime(&naive)
                {
                    return Some(dt.with_timezone(&Utc));
                }
            }
        }

        None
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    /// Calendar day of `dt` in the handler's timezone.
    pub fn local_date(&self, dt: DateTime<Utc>) -> NaiveDate {
        dt.with_timezone(&self.default_tz).date_naive()
    }

    /// Today's date in the handler's timezone.
    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }

    /// Expose the configured default timezone.
    pub fn default_tz(&self) -> Tz {
        self.default_tz
    }
}

// ── Date parsing ──────────────────────────────────────────────────────────────

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| MeterError::TimestampParse(s.to_string()))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone as _, Timelike};

    // ── TimezoneHandler::validate_timezone ───────────────────────────────────

    #[test]
    fn test_validate_timezone_valid() {
        assert!(TimezoneHandler::validate_timezone("Europe/Moscow"));
        assert!(TimezoneHandler::validate_timezone("Europe/London"));
        assert!(TimezoneHandler::validate_timezone("UTC"));
    }

    #[test]
    fn test_validate_timezone_invalid() {
        assert!(!TimezoneHandler::validate_timezone("Mars/Olympus"));
        assert!(!TimezoneHandler::validate_timezone(""));
    }

    // ── TimezoneHandler::new ─────────────────────────────────────────────────

    #[test]
    fn test_new_valid_timezone() {
        let handler = TimezoneHandler::new("Europe/Berlin");
        assert_eq!(handler.default_tz(), Tz::Europe__Berlin);
    }

    #[test]
    fn test_new_invalid_timezone_falls_back_to_utc() {
        let handler = TimezoneHandler::new("Invalid/Timezone");
        assert_eq!(handler.default_tz(), Tz::UTC);
    }

    // ── TimezoneHandler::parse_timestamp ─────────────────────────────────────

    #[test]
    fn test_parse_timestamp_z_suffix() {
        let handler = TimezoneHandler::default();
        let dt = handler.parse_timestamp("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        let handler = TimezoneHandler::default();
        let dt = handler
            .parse_timestamp("2024-01-15T12:00:00+02:00")
            .unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_timestamp_naive_uses_handler_timezone() {
        let handler = TimezoneHandler::new("Europe/Berlin");
        let dt = handler.parse_timestamp("2024-01-15 12:00:00").unwrap();
        // Berlin is UTC+1 in winter.
        assert_eq!(dt.hour(), 11);
    }

    #[test]
    fn test_parse_timestamp_empty_returns_none() {
        let handler = TimezoneHandler::default();
        assert!(handler.parse_timestamp("").is_none());
        assert!(handler.parse_timestamp("   ").is_none());
    }

    #[test]
    fn test_parse_timestamp_garbage_returns_none() {
        let handler = TimezoneHandler::default();
        assert!(handler.parse_timestamp("not-a-date").is_none());
    }

    // ── TimezoneHandler::local_date ──────────────────────────────────────────

    #[test]
    fn test_local_date_utc() {
        let handler = TimezoneHandler::default();
        let dt = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
        assert_eq!(
            handler.local_date(dt),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_local_date_crosses_midnight_east_of_utc() {
        let handler = TimezoneHandler::new("Europe/Moscow");
        // 23:30 UTC is 02:30 the next day in Moscow (UTC+3).
        let dt = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
        assert_eq!(
            handler.local_date(dt),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    // ── parse_date ───────────────────────────────────────────────────────────

    #[test]
    fn test_parse_date_valid() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("29.02.2024").is_err());
    }

    // ── get_system_timezone ──────────────────────────────────────────────────

    #[test]
    fn test_get_system_timezone_returns_nonempty_string() {
        assert!(!get_system_timezone().is_empty());
    }
}
