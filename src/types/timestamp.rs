//! Lenient parsing of the timestamp spellings that show up in source tables and
//! partition files.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parses a timestamp string into a naive (station-local) `NaiveDateTime`.
///
/// Accepts, in order: plain ISO-8601 datetimes with `T` or space separator
/// (optionally with fractional seconds), RFC 3339 with an offset (converted to
/// UTC and stripped), and bare dates (midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    if let Ok(dt) = raw.parse::<DateTime<FixedOffset>>() {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Truncates `timestamp` to the start of its hour. Forecast issue instants are
/// kept at hourly resolution.
pub fn floor_to_hour(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(timestamp)
}

pub(crate) fn format_timestamp(timestamp: NaiveDateTime, format: &str) -> String {
    timestamp.format(format).to_string()
}

/// Rounds `value` to `precision` decimal places.
pub(crate) fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
