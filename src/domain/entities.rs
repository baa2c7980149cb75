//! Domain entities. Pure data structures for the scheduling core.
//!
//! Field names serialize as camelCase to match the remote record store. Day-of-week is
//! normalized during deserialization, so a `WeeklySlot` in memory never carries the
//! upstream format skew: it is either a known `Weekday` or an explicit `Unknown`.

use super::errors::DomainError;
use super::overlap::{TimeRange, instant_on};
use super::temporal::{RawDay, normalize_day_of_week};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Canonical day of week. 0 = Sunday, 6 = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Sunday = 0,
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn from_index(idx: u8) -> Option<Self> {
        Self::ALL.get(idx as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn of_date(date: NaiveDate) -> Self {
        Self::ALL[date.weekday().num_days_from_sunday() as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Day-of-week after ingestion. Unrecognized input is kept verbatim for display
/// but never takes part in overlap arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDay", into = "RawDay")]
pub enum SlotDay {
    Known(Weekday),
    Unknown(RawDay),
}

impl SlotDay {
    pub fn known(&self) -> Option<Weekday> {
        match self {
            SlotDay::Known(d) => Some(*d),
            SlotDay::Unknown(_) => None,
        }
    }
}

impl Default for SlotDay {
    fn default() -> Self {
        SlotDay::Unknown(RawDay::Text(String::new()))
    }
}

impl From<RawDay> for SlotDay {
    fn from(raw: RawDay) -> Self {
        match normalize_day_of_week(&raw).and_then(Weekday::from_index) {
            Some(d) => SlotDay::Known(d),
            None => SlotDay::Unknown(raw),
        }
    }
}

/// Known days are written 1-based (Sunday = 1) so they read back through
/// `normalize_day_of_week` unchanged.
impl From<SlotDay> for RawDay {
    fn from(day: SlotDay) -> Self {
        match day {
            SlotDay::Known(d) => RawDay::Number(d.index() as i64 + 1),
            SlotDay::Unknown(raw) => raw,
        }
    }
}

impl From<Weekday> for SlotDay {
    fn from(d: Weekday) -> Self {
        SlotDay::Known(d)
    }
}

impl std::fmt::Display for SlotDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotDay::Known(d) => write!(f, "{}", d),
            SlotDay::Unknown(raw) => write!(f, "? ({})", raw),
        }
    }
}

/// Capacity category of a weekly template. Not validated by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    #[default]
    Private,
    Pair,
    Group,
}

impl SlotType {
    pub const ALL: [SlotType; 3] = [SlotType::Private, SlotType::Pair, SlotType::Group];

    pub fn as_str(self) -> &'static str {
        match self {
            SlotType::Private => "private",
            SlotType::Pair => "pair",
            SlotType::Group => "group",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeeklyStatus {
    #[default]
    Active,
    Paused,
}

impl WeeklyStatus {
    pub fn toggled(self) -> Self {
        match self {
            WeeklyStatus::Active => WeeklyStatus::Paused,
            WeeklyStatus::Paused => WeeklyStatus::Active,
        }
    }
}

/// Recurring weekly availability template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySlot {
    pub id: String,
    #[serde(default)]
    pub teacher_id: String,
    #[serde(default)]
    pub day_of_week: SlotDay,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(rename = "type", default)]
    pub slot_type: SlotType,
    #[serde(default)]
    pub is_fixed: bool,
    #[serde(default)]
    pub reserved_for_ids: Vec<String>,
    #[serde(default)]
    pub status: WeeklyStatus,
}

impl WeeklySlot {
    pub fn is_active(&self) -> bool {
        self.status == WeeklyStatus::Active
    }
}

/// Values for creating or editing a weekly template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySlotDraft {
    pub teacher_id: String,
    pub day_of_week: SlotDay,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    pub is_fixed: bool,
    pub reserved_for_ids: Vec<String>,
    pub status: WeeklyStatus,
}

impl From<&WeeklySlot> for WeeklySlotDraft {
    fn from(slot: &WeeklySlot) -> Self {
        Self {
            teacher_id: slot.teacher_id.clone(),
            day_of_week: slot.day_of_week.clone(),
            start_time: slot.start_time.clone(),
            end_time: slot.end_time.clone(),
            slot_type: slot.slot_type,
            is_fixed: slot.is_fixed,
            reserved_for_ids: slot.reserved_for_ids.clone(),
            status: slot.status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryStatus {
    #[default]
    Open,
    Booked,
    Blocked,
    Canceled,
}

impl InventoryStatus {
    /// Allowed status transitions. `Canceled` is terminal; `Blocked -> Open` is the only
    /// way back out of a closed state.
    pub fn can_transition_to(self, next: InventoryStatus) -> bool {
        use InventoryStatus::*;
        matches!(
            (self, next),
            (Open, Booked) | (Open, Blocked) | (Blocked, Open) | (Open | Blocked | Booked, Canceled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InventoryStatus::Open => "open",
            InventoryStatus::Booked => "booked",
            InventoryStatus::Blocked => "blocked",
            InventoryStatus::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete, date-specific bookable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotInventory {
    pub id: String,
    #[serde(default)]
    pub teacher_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub status: InventoryStatus,
    /// Committed lessons already linked to this unit.
    #[serde(default)]
    pub lessons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    /// Template this unit was materialized from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_slot_id: Option<String>,
    /// Optimistic-concurrency token. Absent when the store does not version records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl SlotInventory {
    pub fn time_range(&self) -> Option<TimeRange> {
        TimeRange::on_date(&self.date, &self.start_time, &self.end_time)
    }
}

/// Values for creating a one-off (or materialized) inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDraft {
    pub teacher_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: InventoryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_slot_id: Option<String>,
}

impl InventoryDraft {
    pub fn open(teacher_id: &str, date: &str, start_time: &str, end_time: &str) -> Self {
        Self {
            teacher_id: teacher_id.to_string(),
            date: date.to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            status: InventoryStatus::Open,
            student_id: None,
            weekly_slot_id: None,
        }
    }
}

/// Field edit of an inventory record.
///
/// `status` always carries the record's current status: a bare field update must never
/// be read by the store as a status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryUpdate {
    pub teacher_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: InventoryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

/// Deliberate status transition of an inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: InventoryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

/// A committed lesson. Owned by the record store; the core only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub teacher_id: String,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub student_name: Option<String>,
    pub date: String,
    pub start_time: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub slot_id: Option<String>,
}

impl Lesson {
    pub fn time_range(&self) -> Option<TimeRange> {
        let start = instant_on(&self.date, &self.start_time)?;
        Some(TimeRange {
            start,
            end: start + chrono::Duration::minutes(self.duration_minutes as i64),
        })
    }
}

/// Longest range `DateRange::starting` accepts.
pub const MAX_RANGE_DAYS: i64 = 366;

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// `days` consecutive dates starting at `from`, between 1 and `MAX_RANGE_DAYS`.
    pub fn starting(from: NaiveDate, days: i64) -> Result<Self, DomainError> {
        if !(1..=MAX_RANGE_DAYS).contains(&days) {
            return Err(DomainError::Validation(format!(
                "range must cover 1 to {} days, got {}",
                MAX_RANGE_DAYS, days
            )));
        }
        let to = from
            .checked_add_days(chrono::Days::new((days - 1) as u64))
            .ok_or_else(|| {
                DomainError::Validation(format!("{} days from {} is out of range", days, from))
            })?;
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.from.iter_days().take_while(move |d| *d <= self.to)
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}
