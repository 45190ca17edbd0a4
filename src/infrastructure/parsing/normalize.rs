//! Text normalization helpers for labeled listing fields

use chrono::{NaiveDate, NaiveTime, SecondsFormat};
use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::expect_used)]
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s\s+").expect("whitespace pattern is valid"));

/// Date layouts accepted for `job-date-posted`, tried in order.
const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d", "%m/%d/%Y"];

/// Collapse every run of two or more whitespace characters into one space.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").into_owned()
}

/// Split `text` on `separator` and keep `segment`, trimmed and collapsed.
///
/// Returns an empty string when the separator does not occur in `text`.
pub fn strip_label(text: &str, separator: char, segment: usize) -> String {
    if !text.contains(separator) {
        return String::new();
    }

    text.split(separator)
        .nth(segment)
        .map(|part| collapse_whitespace(part.trim()))
        .unwrap_or_default()
}

/// Convert a posted-on date into an ISO-8601 UTC timestamp.
///
/// The date is read as a local calendar day and its wall-clock midnight is
/// serialized at UTC, so `Feb 03, 2017` becomes `2017-02-03T00:00:00.000Z`
/// regardless of the host timezone. Unparseable input yields an empty string.
pub fn to_iso_date(text: &str) -> String {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .map(|date| {
            date.and_time(NaiveTime::MIN)
                .and_utc()
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        })
        .unwrap_or_default()
}
