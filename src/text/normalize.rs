use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use unicode_normalization::UnicodeNormalization;

use super::is_combining_mark;
use crate::error::{Error, Result};

/// Lowercases, strips diacritics and trims. Used as the equality key for
/// case and accent insensitive comparisons: `"Théâtre"` and `"theatre"` match.
#[must_use]
pub fn normalize_text(s: &str) -> String {
    s.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Anything `normalize_date` accepts.
#[derive(Debug, Clone, Copy)]
pub enum DateInput<'a> {
    Text(&'a str),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl<'a> From<&'a str> for DateInput<'a> {
    fn from(s: &'a str) -> Self {
        DateInput::Text(s)
    }
}

impl<'a> From<&'a String> for DateInput<'a> {
    fn from(s: &'a String) -> Self {
        DateInput::Text(s.as_str())
    }
}

impl From<NaiveDate> for DateInput<'_> {
    fn from(d: NaiveDate) -> Self {
        DateInput::Date(d)
    }
}

impl From<DateTime<Utc>> for DateInput<'_> {
    fn from(d: DateTime<Utc>) -> Self {
        DateInput::DateTime(d)
    }
}

/// Formats a date as `YYYY-MM-DD`.
///
/// Accepts `DD/MM/YYYY` (or `DD-MM-YYYY`), ISO dates and timestamps, and
/// date values. Text that cannot be understood is returned unchanged and a
/// warning is logged; callers comparing keys get a non-matching key rather
/// than an error. Write paths use [`parse_date`] instead.
pub fn normalize_date<'a>(input: impl Into<DateInput<'a>>) -> String {
    match input.into() {
        DateInput::Date(d) => d.format("%Y-%m-%d").to_string(),
        DateInput::DateTime(dt) => dt.date_naive().format("%Y-%m-%d").to_string(),
        DateInput::Text(s) => {
            let trimmed = s.trim();
            if let Some((day, month, year)) = split_day_first(trimmed) {
                if (1..=12).contains(&month) && (1..=31).contains(&day) {
                    return format!("{year:04}-{month:02}-{day:02}");
                }
                tracing::warn!("Failed to normalize date '{s}': invalid month or day");
                return s.to_string();
            }

            match parse_generic(trimmed) {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => {
                    tracing::warn!("Failed to normalize date '{s}'");
                    s.to_string()
                }
            }
        }
    }
}

/// Strict counterpart of [`normalize_date`]: the same formats, but an
/// unparseable or impossible date is a validation error.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    let parsed = match split_day_first(trimmed) {
        Some((day, month, year)) => NaiveDate::from_ymd_opt(year, month, day),
        None => parse_generic(trimmed),
    };
    parsed.ok_or_else(|| Error::validation(format!("invalid date '{s}'")))
}

/// Parses an RFC 3339 timestamp, or a date taken as midnight UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = parse_date(s)?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Splits `D/M/YYYY` style input. Returns `(day, month, year)`.
fn split_day_first(s: &str) -> Option<(u32, u32, i32)> {
    let parts: Vec<&str> = s.split(['/', '-']).collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };

    let all_digits = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());
    if !(all_digits(day) && all_digits(month) && all_digits(year)) {
        return None;
    }
    if day.len() > 2 || month.len() > 2 || year.len() != 4 {
        return None;
    }

    Some((day.parse().ok()?, month.parse().ok()?, year.parse().ok()?))
}

fn parse_generic(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y/%m/%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|ndt| ndt.date())
}
