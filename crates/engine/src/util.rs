//! Internal helpers for timestamps and storage keys.
//!
//! These utilities are **not** part of the public API. They centralize the
//! date handling shared by the normalizer, the store and the projections.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Parse a date or date-time string.
///
/// Accepts RFC 3339 (`2026-10-17T08:30:00Z`, any offset), a naive date-time
/// (read as UTC) and a bare `YYYY-MM-DD` date (UTC midnight).
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Canonical timestamp form: UTC, millisecond precision, `Z` suffix.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Storage stem for a log record: second-precision timestamp plus kind,
/// with characters that are unsafe in file names replaced by `-`.
pub(crate) fn log_stem(ts: &str, kind: &str) -> String {
    let safe_ts = match parse_timestamp(ts) {
        Some(parsed) => parsed.format("%Y-%m-%dT%H-%M-%S").to_string(),
        None => ts.replace([':', '.'], "-"),
    };
    let safe_ts = safe_ts.replace(['<', '>', ':', '"', '/', '\\', '|', '?', '*'], "-");
    format!("{safe_ts}_{kind}")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_supported_formats() {
        let midnight = Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2026-12-31"), Some(midnight));
        assert_eq!(parse_timestamp("2026-12-31T00:00:00Z"), Some(midnight));
        assert_eq!(parse_timestamp("2026-12-31T03:00:00+03:00"), Some(midnight));
        assert_eq!(parse_timestamp(" 2026-12-31T00:00:00.000 "), Some(midnight));
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn formats_like_iso_strings() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 17, 8, 5, 3).unwrap();
        assert_eq!(format_timestamp(ts), "2026-10-17T08:05:03.000Z");
    }

    #[test]
    fn stems_are_filename_safe() {
        assert_eq!(
            log_stem("2026-10-17T08:05:03.250Z", "deposit"),
            "2026-10-17T08-05-03_deposit"
        );
        assert_eq!(log_stem("when?12:30.5", "set"), "when-12-30-5_set");
    }
}
