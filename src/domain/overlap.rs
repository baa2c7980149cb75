//! Overlap detector. Half-open interval checks for weekly templates and dated slots.
//!
//! All intervals are `[start, end)`: back-to-back ranges (`a.end == b.start`) never
//! overlap. Inputs that cannot be parsed never produce an overlap.

use super::conflicts::WeeklySlotOverlap;
use super::entities::{SlotDay, WeeklySlot, WeeklySlotDraft, parse_date};
use super::temporal::parse_time_to_minutes;
use chrono::{DateTime, NaiveDateTime};

/// Wall-clock interval on the calendar axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    /// Build from a `YYYY-MM-DD` date and two `HH:MM` times. `None` if any part fails to parse.
    pub fn on_date(date: &str, start_time: &str, end_time: &str) -> Option<Self> {
        Some(Self {
            start: instant_on(date, start_time)?,
            end: instant_on(date, end_time)?,
        })
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Combine a date and an `HH:MM` time into a naive instant.
pub fn instant_on(date: &str, hhmm: &str) -> Option<NaiveDateTime> {
    let day = parse_date(date)?;
    let minutes = parse_time_to_minutes(hhmm)?;
    Some(day.and_hms_opt(0, 0, 0)? + chrono::Duration::minutes(minutes as i64))
}

/// Format an instant the way the conflict endpoint expects (`YYYY-MM-DDTHH:MM:SS`).
pub fn format_instant(instant: &NaiveDateTime) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Parse an ISO-8601 instant. Offset-bearing values are compared in UTC; naive values
/// (with or without seconds) are taken as written.
pub fn parse_iso_instant(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Half-open overlap of two ISO-instant ranges. Unparsable input is never an overlap.
pub fn has_overlap(start_a: &str, end_a: &str, start_b: &str, end_b: &str) -> bool {
    let parsed = (
        parse_iso_instant(start_a),
        parse_iso_instant(end_a),
        parse_iso_instant(start_b),
        parse_iso_instant(end_b),
    );
    match parsed {
        (Some(sa), Some(ea), Some(sb), Some(eb)) => sa < eb && sb < ea,
        _ => false,
    }
}

/// The fields of a weekly template being checked. Missing values are `None`;
/// empty strings count as missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeeklyCandidate<'a> {
    pub id: Option<&'a str>,
    pub teacher_id: Option<&'a str>,
    pub day_of_week: Option<&'a SlotDay>,
    pub start_time: Option<&'a str>,
    pub end_time: Option<&'a str>,
}

impl<'a> WeeklyCandidate<'a> {
    pub fn from_slot(slot: &'a WeeklySlot) -> Self {
        Self {
            id: non_empty(&slot.id),
            teacher_id: non_empty(&slot.teacher_id),
            day_of_week: Some(&slot.day_of_week),
            start_time: non_empty(&slot.start_time),
            end_time: non_empty(&slot.end_time),
        }
    }

    pub fn from_draft(draft: &'a WeeklySlotDraft, id: Option<&'a str>) -> Self {
        Self {
            id,
            teacher_id: non_empty(&draft.teacher_id),
            day_of_week: Some(&draft.day_of_week),
            start_time: non_empty(&draft.start_time),
            end_time: non_empty(&draft.end_time),
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.trim().is_empty() { None } else { Some(s) }
}

/// Weekly templates whose `[start, end)` intersects the candidate's on the same day.
///
/// Advisory only. Siblings are skipped when they are the candidate itself, belong to a
/// different teacher, are paused, or have a day or time that cannot be determined.
/// Reported days are the normalized ones.
pub fn detect_weekly_slot_overlaps(
    candidate: &WeeklyCandidate<'_>,
    all_slots: &[WeeklySlot],
) -> Vec<WeeklySlotOverlap> {
    let (Some(day), Some(start), Some(end)) = (
        candidate.day_of_week,
        candidate.start_time,
        candidate.end_time,
    ) else {
        return Vec::new();
    };
    let Some(day) = day.known() else {
        return Vec::new();
    };
    let (Some(cand_start), Some(cand_end)) =
        (parse_time_to_minutes(start), parse_time_to_minutes(end))
    else {
        return Vec::new();
    };

    all_slots
        .iter()
        .filter(|s| candidate.id.is_none_or(|id| s.id != id))
        .filter(|s| s.is_active())
        .filter(|s| match (candidate.teacher_id, non_empty(&s.teacher_id)) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        })
        .filter_map(|s| {
            let sibling_day = s.day_of_week.known()?;
            if sibling_day != day {
                return None;
            }
            let sib_start = parse_time_to_minutes(non_empty(&s.start_time)?)?;
            let sib_end = parse_time_to_minutes(non_empty(&s.end_time)?)?;
            (cand_start < sib_end && sib_start < cand_end).then(|| WeeklySlotOverlap {
                slot_id: s.id.clone(),
                day_of_week: sibling_day.index(),
                start_time: s.start_time.clone(),
                end_time: s.end_time.clone(),
            })
        })
        .collect()
}
