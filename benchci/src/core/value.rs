//! Typed comparison values.
//!
//! Every sortable field is turned into a [`SortValue`] once per record before
//! sorting, so the comparator never re-parses strings.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::core::record::{Scalar, Timestamp};

/// Comparable form of a field value.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    /// Epoch milliseconds.
    Instant(i64),
    Text(String),
    /// Absent field or a timestamp that does not parse.
    Unordered,
}

impl SortValue {
    /// Lenient number detection for text fields: a leading number wins,
    /// anything else stays text.
    pub fn from_text(text: &str) -> Self {
        match parse_number_prefix(text) {
            Some(value) => SortValue::Number(value),
            None => SortValue::Text(text.to_string()),
        }
    }

    pub fn from_scalar(value: Option<&Scalar>) -> Self {
        match value {
            Some(Scalar::Number(value)) => SortValue::Number(*value),
            Some(Scalar::Text(text)) => SortValue::from_text(text),
            None => SortValue::Unordered,
        }
    }

    pub fn from_count(value: Option<u64>) -> Self {
        match value {
            Some(count) => SortValue::Number(count as f64),
            None => SortValue::Unordered,
        }
    }

    pub fn from_timestamp(value: &Timestamp) -> Self {
        match parse_instant(value) {
            Some(millis) => SortValue::Instant(millis),
            None => SortValue::Unordered,
        }
    }

    pub fn is_ordered(&self) -> bool {
        !matches!(self, SortValue::Unordered)
    }

    /// Ascending comparison between two ordered values.
    ///
    /// Numbers sort before text when a field mixes both. Returns `None` when
    /// either side is [`SortValue::Unordered`].
    pub fn compare(&self, other: &SortValue) -> Option<Ordering> {
        match (self, other) {
            (SortValue::Unordered, _) | (_, SortValue::Unordered) => None,
            (SortValue::Number(left), SortValue::Number(right)) => {
                Some(left.partial_cmp(right).unwrap_or(Ordering::Equal))
            }
            (SortValue::Instant(left), SortValue::Instant(right)) => Some(left.cmp(right)),
            (SortValue::Text(left), SortValue::Text(right)) => Some(left.cmp(right)),
            (left, right) => Some(left.rank().cmp(&right.rank())),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::Number(_) => 0,
            SortValue::Instant(_) => 1,
            SortValue::Text(_) => 2,
            SortValue::Unordered => 3,
        }
    }
}

/// Parse the longest leading decimal number in `text`.
///
/// Accepts leading whitespace, a sign, digits with an optional fraction and
/// exponent, or `Infinity`. Trailing garbage is ignored (`"12abc"` is 12).
pub fn parse_number_prefix(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    if trimmed[end..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    trimmed[..end].parse::<f64>().ok()
}

/// Parse a timestamp into epoch milliseconds.
///
/// Text accepts RFC 3339, ISO-8601 date-times without an offset (read as
/// UTC) and bare dates. Numbers are already epoch milliseconds.
pub fn parse_instant(value: &Timestamp) -> Option<i64> {
    match value {
        Timestamp::Millis(millis) if millis.is_finite() => Some(millis.trunc() as i64),
        Timestamp::Millis(_) => None,
        Timestamp::Text(text) => parse_instant_text(text.trim()),
    }
}

fn parse_instant_text(text: &str) -> Option<i64> {
    if text.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp_millis());
    }
    // Naive values are UTC already, so a bare `Z` adds nothing.
    let naive = text
        .strip_suffix('Z')
        .or_else(|| text.strip_suffix('z'))
        .unwrap_or(text);
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(parsed.and_utc().timestamp_millis());
        }
    }
    parse_date_prefix(text)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|parsed| parsed.and_utc().timestamp_millis())
}

/// `YYYY-MM-DD`, `YYYY-MM`, or `YYYY`; missing parts are the first.
fn parse_date_prefix(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    let mut parts = text.split('-');
    let year = parts.next().filter(|year| is_digits(year, 4))?;
    let month = match parts.next() {
        Some(month) if is_digits(month, 2) => month.parse().ok()?,
        Some(_) => return None,
        None => 1,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, 1)
}

fn is_digits(text: &str, len: usize) -> bool {
    text.len() == len && text.bytes().all(|byte| byte.is_ascii_digit())
}
