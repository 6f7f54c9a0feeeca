//! Publication date normalization.
//!
//! Source dates arrive as free-form text (`"March 5th, 2024"`,
//! `"2024-03-05T10:00:00Z"`, RFC 2822 headers, ...). They are only
//! normalized at render time, into `MM/DD/YYYY` in UTC.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

static ORDINAL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)(st|nd|rd|th)").unwrap());

/// Offset-aware layouts not covered by RFC 3339 / RFC 2822.
const ZONED_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S %z"];

/// Date-time layouts without an offset; read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%B %d, %Y %H:%M",
    "%B %d, %Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
    "%a, %B %d, %Y",
    "%A %B %d, %Y",
    "%Y%m%d",
];

/// Parses free-form date text into a UTC calendar date.
pub fn parse_publication_date(input: &str) -> Option<NaiveDate> {
    let cleaned = ORDINAL_SUFFIX.replace(input.trim(), "$1");
    let text = cleaned.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc).date_naive());
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    None
}

/// Formats a source date as `MM/DD/YYYY`, or returns an empty string when
/// the text cannot be parsed.
pub fn format_publication_date(input: &str) -> String {
    parse_publication_date(input)
        .map(|date| date.format("%m/%d/%Y").to_string())
        .unwrap_or_default()
}
