//! Temporal normalizer. Day-of-week and time-of-day parsing.
//!
//! Upstream records disagree on day numbering (0–6 vs 1–7), sometimes send numbers as
//! strings, and sometimes send localized day names. Everything funnels through here so
//! the rest of the crate only ever sees a canonical `0..=6` day (0 = Sunday).
//!
//! Nothing in this module panics or returns an error: unrecognized input yields `None`,
//! and callers skip the comparison.

use serde::{Deserialize, Serialize};

/// English day names, canonical order (index = canonical day).
const ENGLISH_DAYS: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Hebrew day names, canonical order.
const HEBREW_DAYS: [&str; 7] = ["ראשון", "שני", "שלישי", "רביעי", "חמישי", "שישי", "שבת"];

/// Prefix Hebrew sources sometimes put before the day name ("יום שני").
const HEBREW_DAY_PREFIX: &str = "יום";

/// Day-of-week as it arrives from upstream, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDay {
    Number(i64),
    Text(String),
}

impl From<i64> for RawDay {
    fn from(n: i64) -> Self {
        RawDay::Number(n)
    }
}

impl From<i32> for RawDay {
    fn from(n: i32) -> Self {
        RawDay::Number(n as i64)
    }
}

impl From<&str> for RawDay {
    fn from(s: &str) -> Self {
        RawDay::Text(s.to_string())
    }
}

impl std::fmt::Display for RawDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawDay::Number(n) => write!(f, "{}", n),
            RawDay::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Normalize any supported day representation to `0..=6`.
///
/// * Numbers (or numeric strings) in `1..=7` are shifted down by one.
/// * `0` passes through.
/// * English or Hebrew day names map to their canonical index.
/// * Anything else is `None`.
pub fn normalize_day_of_week(input: &RawDay) -> Option<u8> {
    match input {
        RawDay::Number(n) => normalize_day_number(*n),
        RawDay::Text(s) => normalize_day_text(s),
    }
}

fn normalize_day_number(n: i64) -> Option<u8> {
    match n {
        1..=7 => Some((n - 1) as u8),
        0 => Some(0),
        _ => None,
    }
}

fn normalize_day_text(s: &str) -> Option<u8> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return normalize_day_number(n);
    }

    let lower = trimmed.to_lowercase();
    if let Some(idx) = ENGLISH_DAYS.iter().position(|d| *d == lower) {
        return Some(idx as u8);
    }
    // Three-letter forms ("Mon", "Tue").
    if lower.len() == 3 {
        if let Some(idx) = ENGLISH_DAYS.iter().position(|d| d.starts_with(&lower)) {
            return Some(idx as u8);
        }
    }

    let hebrew = trimmed
        .strip_prefix(HEBREW_DAY_PREFIX)
        .map(str::trim)
        .unwrap_or(trimmed);
    HEBREW_DAYS
        .iter()
        .position(|d| *d == hebrew)
        .map(|idx| idx as u8)
}

/// Parse `HH:MM` into minutes since midnight.
///
/// A missing minutes component counts as zero (`"9"` is 540). Ranges are not validated
/// (`"25:00"` is 1500). Returns `None` for empty or non-numeric input.
pub fn parse_time_to_minutes(hhmm: &str) -> Option<u32> {
    let trimmed = hhmm.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut parts = trimmed.splitn(2, ':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = match parts.next() {
        Some(m) if !m.trim().is_empty() => m.trim().parse().ok()?,
        _ => 0,
    };
    hours.checked_mul(60)?.checked_add(minutes)
}

/// Format minutes since midnight back to `HH:MM`.
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
