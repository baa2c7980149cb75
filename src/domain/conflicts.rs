//! Conflict types: check request/response, classified outcomes, reports, override audit.

use super::overlap::{TimeRange, parse_iso_instant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entity name sent to the conflict endpoint and written to the audit log.
pub const SLOT_INVENTORY_ENTITY: &str = "slot_inventory";

/// Where a conflict came from. Determines severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSource {
    /// A committed lesson. Always blocking.
    Lessons,
    /// Another open slot. Always advisory.
    SlotInventory,
    /// A source this client does not know yet. Shown as advisory.
    #[serde(other)]
    Unknown,
}

impl ConflictSource {
    pub fn is_blocking(self) -> bool {
        matches!(self, ConflictSource::Lessons)
    }
}

/// One conflicting record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictItem {
    pub source: ConflictSource,
    #[serde(default)]
    pub record_id: String,
    /// ISO instant.
    #[serde(default)]
    pub start: String,
    /// ISO instant.
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl ConflictItem {
    pub fn is_blocking(&self) -> bool {
        self.source.is_blocking()
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        Some(TimeRange {
            start: parse_iso_instant(&self.start)?,
            end: parse_iso_instant(&self.end)?,
        })
    }

    pub fn student_name(&self) -> Option<&str> {
        self.meta.get("studentName").and_then(|v| v.as_str())
    }

    /// One line for operators: who, when, how long.
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(name) = self.student_name() {
            parts.push(name.to_string());
        }
        match self.time_range() {
            Some(r) => parts.push(format!(
                "{} {}–{} ({} min)",
                r.start.format("%Y-%m-%d"),
                r.start.format("%H:%M"),
                r.end.format("%H:%M"),
                r.duration_minutes()
            )),
            None => parts.push(format!("{} – {}", self.start, self.end)),
        }
        if !self.label.is_empty() {
            parts.push(self.label.clone());
        }
        parts.join(" · ")
    }
}

/// Structured list of conflicts attached to a refused save.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConflictReport {
    pub message: Option<String>,
    pub items: Vec<ConflictItem>,
}

impl ConflictReport {
    pub fn new(items: Vec<ConflictItem>) -> Self {
        Self {
            message: None,
            items,
        }
    }

    pub fn blocking(&self) -> impl Iterator<Item = &ConflictItem> {
        self.items.iter().filter(|i| i.is_blocking())
    }
}

impl std::fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lessons = self.blocking().count();
        let slots = self.items.len() - lessons;
        match &self.message {
            Some(m) => write!(f, "{}", m)?,
            None => write!(f, "{} lesson conflict(s), {} slot conflict(s)", lessons, slots)?,
        }
        for item in &self.items {
            write!(f, "\n  - {}", item.describe())?;
        }
        Ok(())
    }
}

/// Result of the conflict resolver. Callers must refuse to commit while `blocking`
/// holds any item; they may commit with advisory items but must then record an override.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConflictOutcome {
    pub blocking: Option<Vec<ConflictItem>>,
    pub advisory: Vec<ConflictItem>,
    /// The remote check failed and the outcome was cleared (fail-open).
    pub remote_failed: bool,
}

impl ConflictOutcome {
    pub fn has_blocking(&self) -> bool {
        self.blocking.as_ref().is_some_and(|b| !b.is_empty())
    }

    pub fn is_clear(&self) -> bool {
        !self.has_blocking() && self.advisory.is_empty()
    }

    pub fn fail_open() -> Self {
        Self {
            blocking: None,
            advisory: Vec::new(),
            remote_failed: true,
        }
    }
}

/// Body of the conflict check endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckRequest {
    pub entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_lesson_ids: Option<Vec<String>>,
    pub teacher_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub start: String,
    /// `HH:MM`
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckResponse {
    #[serde(default)]
    pub has_conflicts: bool,
    #[serde(default)]
    pub conflicts: Vec<ConflictItem>,
}

/// Entry in a 409 write-conflict payload. Severity comes from the list it is in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictEntry {
    #[serde(default, alias = "id")]
    pub record_id: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl ConflictEntry {
    fn into_item(self, source: ConflictSource) -> ConflictItem {
        ConflictItem {
            source,
            record_id: self.record_id,
            start: self.start,
            end: self.end,
            label: self.label,
            meta: self.meta,
        }
    }
}

/// `conflicts` object of a 409 / `CONFLICT_ERROR` response from a write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteConflictPayload {
    #[serde(default)]
    pub lessons: Vec<ConflictEntry>,
    #[serde(default)]
    pub open_slots: Vec<ConflictEntry>,
}

impl WriteConflictPayload {
    pub fn into_report(self, message: Option<String>) -> ConflictReport {
        let mut items: Vec<ConflictItem> = self
            .lessons
            .into_iter()
            .map(|e| e.into_item(ConflictSource::Lessons))
            .collect();
        items.extend(
            self.open_slots
                .into_iter()
                .map(|e| e.into_item(ConflictSource::SlotInventory)),
        );
        ConflictReport { message, items }
    }
}

/// Overlap between two weekly templates: the *other* template's slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySlotOverlap {
    pub slot_id: String,
    /// Normalized, `0..=6`.
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
}

/// Record of an operator knowingly saving over advisory conflicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideAuditEntry {
    pub record_id: String,
    pub entity: String,
    pub teacher_id: String,
    pub date: String,
    pub conflict_summary: String,
    pub recorded_at: DateTime<Utc>,
}

impl OverrideAuditEntry {
    pub fn for_inventory(
        record_id: &str,
        teacher_id: &str,
        date: &str,
        overridden: &[ConflictItem],
    ) -> Self {
        Self {
            record_id: record_id.to_string(),
            entity: SLOT_INVENTORY_ENTITY.to_string(),
            teacher_id: teacher_id.to_string(),
            date: date.to_string(),
            conflict_summary: summarize_conflicts(overridden),
            recorded_at: Utc::now(),
        }
    }
}

/// One-line digest: `2 advisory conflict(s): slot abc 10:00–11:00; slot def 10:30–11:30`.
pub fn summarize_conflicts(items: &[ConflictItem]) -> String {
    let parts: Vec<String> = items
        .iter()
        .map(|i| {
            let kind = if i.is_blocking() { "lesson" } else { "slot" };
            match i.time_range() {
                Some(r) => format!(
                    "{} {} {}–{}",
                    kind,
                    i.record_id,
                    r.start.format("%H:%M"),
                    r.end.format("%H:%M")
                ),
                None => format!("{} {}", kind, i.record_id),
            }
        })
        .collect();
    format!("{} advisory conflict(s): {}", items.len(), parts.join("; "))
}
