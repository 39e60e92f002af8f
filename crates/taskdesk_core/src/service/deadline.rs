//! Lenient ISO-8601 deadline parsing.
//!
//! Accepts extended (`2025-01-01T10:00`) and basic (`20250101T1000`) forms:
//! date-only, hour, minute and second precision, optional fractional seconds,
//! `T` or a single space as separator, and an optional `Z`, `±HH`, `±HHMM` or
//! `±HH:MM` offset. Naive values are read as UTC. Anything else parses to
//! `None`; callers treat that as "no deadline supplied".

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y%m%dT%H%M%#z",
    "%Y%m%dT%H%M%S%.f%#z",
];
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y%m%dT%H%M",
    "%Y%m%dT%H%M%S%.f",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Parses deadline text into Unix epoch milliseconds.
pub fn parse_deadline(text: &str) -> Option<i64> {
    let normalized = normalize(text)?;

    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&normalized, format).ok())
    {
        return Some(parsed.timestamp_millis());
    }

    if let Some(parsed) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
    {
        return Some(parsed.and_utc().timestamp_millis());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&normalized, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
}

/// Formats epoch milliseconds back to `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_deadline(epoch_ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|value| value.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

fn normalize(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut normalized = trimmed.to_string();
    if normalized.get(10..11) == Some(" ") {
        normalized.replace_range(10..11, "T");
    }
    if let Some(stripped) = normalized
        .strip_suffix('Z')
        .or_else(|| normalized.strip_suffix('z'))
    {
        normalized = format!("{stripped}+00:00");
    }
    Some(pad_hour_only_time(normalized))
}

/// `2025-01-01T10` and `20250101T10+02` carry no minutes, which chrono needs.
fn pad_hour_only_time(mut value: String) -> String {
    let Some(separator) = value.find('T') else {
        return value;
    };
    let time = &value[separator + 1..];
    let hour_only = time.len() >= 2
        && time.as_bytes()[..2].iter().all(u8::is_ascii_digit)
        && matches!(time.as_bytes().get(2), None | Some(b'+') | Some(b'-'));
    if hour_only {
        let minutes = if value[..separator].contains('-') {
            ":00"
        } else {
            "00"
        };
        value.insert_str(separator + 3, minutes);
    }
    value
}
