//! Normalization for the vehicle introduction date column.
//!
//! Source extracts carry this column in several textual layouts:
//!   - **Month/year shorthand**: `6/2002` or `06/2002`, read as day 1
//!   - **ISO dates**: `2020-06-15`, optionally with a `14:30:00` suffix
//!   - **Slash dates**: `15/06/2020` (day-first) or `06/15/2020`
//!
//! [`normalize`] maps any raw token, including nulls, blanks, and garbage,
//! to an [`IntroDate`]. The mapping is total and deterministic: every input
//! yields a defined output, the same token always yields the same output,
//! and parse failures of any kind collapse to [`IntroDate::Invalid`] instead
//! of propagating. Time-of-day suffixes are discarded after parsing.
//!
//! When a slash date is valid under both the day-first and the month-first
//! reading, the day-first reading wins, consistent with the shorthand rule.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Outcome of normalizing one raw date token.
///
/// Callers must handle both variants; there is no null-punning and no
/// distinction between the ways a token can fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroDate {
    Parsed(NaiveDate),
    Invalid,
}

impl IntroDate {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            IntroDate::Parsed(date) => Some(*date),
            IntroDate::Invalid => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, IntroDate::Invalid)
    }
}

impl fmt::Display for IntroDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntroDate::Parsed(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            IntroDate::Invalid => write!(f, "invalid"),
        }
    }
}

/// Year plausibility bounds applied to every parsed date.
///
/// The bound is an explicit check, not an artifact of the underlying
/// parser: the default accepts 4-digit years only, so a shorthand such as
/// `6/20020` fails instead of producing year 20020.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub min_year: i32,
    pub max_year: i32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            min_year: 1000,
            max_year: 9999,
        }
    }
}

impl NormalizeOptions {
    fn admits(&self, year: i32) -> bool {
        (self.min_year..=self.max_year).contains(&year)
    }
}

/// Normalize one raw vehicle introduction date token with default bounds.
pub fn normalize(raw: Option<&str>) -> IntroDate {
    normalize_with(raw, &NormalizeOptions::default())
}

/// Normalize one raw token against explicit year bounds.
///
/// Rules, first match wins:
/// 1. Null, empty, or whitespace-only input is `Invalid`.
/// 2. A token with a single `/` and at most 7 characters after trimming is
///    a month/year shorthand, read as day 1 of that month.
/// 3. Anything else must match one of the full layouts: ISO date, ISO
///    date-time (time dropped), or a slash date read day-first.
pub fn normalize_with(raw: Option<&str>, options: &NormalizeOptions) -> IntroDate {
    let Some(raw) = raw else {
        return IntroDate::Invalid;
    };

    let token = raw.trim();
    if token.is_empty() {
        return IntroDate::Invalid;
    }

    let parsed = if is_month_year_shorthand(token) {
        parse_month_year(token)
    } else {
        parse_full(token)
    };

    match parsed {
        Some(date) if options.admits(date.year()) => IntroDate::Parsed(date),
        _ => IntroDate::Invalid,
    }
}

fn is_month_year_shorthand(token: &str) -> bool {
    token.len() <= 7 && token.split('/').count() == 2
}

/// `6/2002` becomes 2002-06-01. Both segments must be bare digits and the
/// month must be a real month; `13/2020` fails here.
fn parse_month_year(token: &str) -> Option<NaiveDate> {
    let (month, year) = token.split_once('/')?;
    if !is_digits(month) || !is_digits(year) {
        return None;
    }

    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn is_digits(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Full-layout fallback. The regexes decide which layout a token claims to
/// be; chrono then validates the calendar values.
fn parse_full(token: &str) -> Option<NaiveDate> {
    if iso_date_pattern().is_match(token) {
        return NaiveDate::parse_from_str(token, "%Y-%m-%d").ok();
    }

    if iso_datetime_pattern().is_match(token) {
        return NaiveDateTime::parse_from_str(token, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(token, "%Y-%m-%dT%H:%M:%S"))
            .ok()
            .map(|datetime| datetime.date());
    }

    if slash_date_pattern().is_match(token) {
        // Day-first wins when both readings are valid.
        return NaiveDate::parse_from_str(token, "%d/%m/%Y")
            .or_else(|_| NaiveDate::parse_from_str(token, "%m/%d/%Y"))
            .ok();
    }

    None
}

fn iso_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("invalid ISO date regex"))
}

fn iso_datetime_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}[ T]\d{1,2}:\d{2}:\d{2}$")
            .expect("invalid ISO date-time regex")
    })
}

fn slash_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("invalid slash date regex"))
}
