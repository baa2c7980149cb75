//! Conflict resolver: classify a proposed one-off slot into blocking and advisory conflicts.
//!
//! - Local pass against the loaded inventory window (instant, advisory only)
//! - Remote pass through `ConflictCheckPort` (authoritative)
//! - Lesson conflicts block and suppress advisory ones
//! - A failed remote check fails open

use crate::domain::conflicts::SLOT_INVENTORY_ENTITY;
use crate::domain::overlap::{TimeRange, format_instant};
use crate::domain::{
    ConflictCheckRequest, ConflictItem, ConflictOutcome, ConflictSource, DomainError,
    InventoryStatus, SlotInventory,
};
use crate::ports::ConflictCheckPort;
use crate::usecases::in_flight::InFlight;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// A one-off slot being created (`record_id = None`) or edited.
#[derive(Debug, Clone, Copy)]
pub struct InventoryCandidate<'a> {
    pub record_id: Option<&'a str>,
    pub teacher_id: &'a str,
    pub date: &'a str,
    pub start_time: &'a str,
    pub end_time: &'a str,
    /// Lessons already linked to the record being edited.
    pub linked_lesson_ids: &'a [String],
}

impl<'a> InventoryCandidate<'a> {
    fn request(&self) -> ConflictCheckRequest {
        ConflictCheckRequest {
            entity: SLOT_INVENTORY_ENTITY.to_string(),
            record_id: self.record_id.map(str::to_string),
            linked_lesson_ids: if self.linked_lesson_ids.is_empty() {
                None
            } else {
                Some(self.linked_lesson_ids.to_vec())
            },
            teacher_id: self.teacher_id.to_string(),
            date: self.date.to_string(),
            start: self.start_time.to_string(),
            end: self.end_time.to_string(),
        }
    }

    fn is_self(&self, item: &ConflictItem) -> bool {
        match item.source {
            ConflictSource::SlotInventory => self.record_id == Some(item.record_id.as_str()),
            ConflictSource::Lessons => self.linked_lesson_ids.contains(&item.record_id),
            ConflictSource::Unknown => false,
        }
    }
}

/// Advisory conflicts against sibling records already in memory: same teacher, same date,
/// not canceled, not the record itself.
pub fn local_pass(candidate: &InventoryCandidate<'_>, siblings: &[SlotInventory]) -> Vec<ConflictItem> {
    let Some(wanted) = TimeRange::on_date(candidate.date, candidate.start_time, candidate.end_time)
    else {
        return Vec::new();
    };
    siblings
        .iter()
        .filter(|s| candidate.record_id.is_none_or(|id| s.id != id))
        .filter(|s| s.date == candidate.date && s.teacher_id == candidate.teacher_id)
        .filter(|s| s.status != InventoryStatus::Canceled)
        .filter_map(|s| {
            let range = s.time_range()?;
            range.overlaps(&wanted).then(|| sibling_item(s, &range))
        })
        .collect()
}

fn sibling_item(slot: &SlotInventory, range: &TimeRange) -> ConflictItem {
    ConflictItem {
        source: ConflictSource::SlotInventory,
        record_id: slot.id.clone(),
        start: format_instant(&range.start),
        end: format_instant(&range.end),
        label: format!("{} slot {}–{}", slot.status, slot.start_time, slot.end_time),
        meta: serde_json::json!({ "status": slot.status, "teacherId": slot.teacher_id }),
    }
}

/// Union by `record_id`, first occurrence kept.
fn union_by_record(items: impl IntoIterator<Item = ConflictItem>) -> Vec<ConflictItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|i| seen.insert(i.record_id.clone()))
        .collect()
}

pub struct ConflictResolver {
    checker: Arc<dyn ConflictCheckPort>,
    in_flight: InFlight,
}

impl ConflictResolver {
    pub fn new(checker: Arc<dyn ConflictCheckPort>) -> Self {
        Self {
            checker,
            in_flight: InFlight::new(),
        }
    }

    pub fn is_checking(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Classify `candidate`. Only fails with `Busy` when a check is already pending.
    pub async fn resolve(
        &self,
        candidate: &InventoryCandidate<'_>,
        siblings: &[SlotInventory],
    ) -> Result<ConflictOutcome, DomainError> {
        let _guard = self.in_flight.try_begin("conflict check")?;
        let local = local_pass(candidate, siblings);

        let response = match self.checker.check(&candidate.request()).await {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    record_id = candidate.record_id.unwrap_or("-"),
                    teacher_id = %candidate.teacher_id,
                    date = %candidate.date,
                    error = %e,
                    "conflict check failed, proceeding without conflict report"
                );
                return Ok(ConflictOutcome::fail_open());
            }
        };

        let unknown = response
            .conflicts
            .iter()
            .filter(|i| i.source == ConflictSource::Unknown)
            .count();
        if unknown > 0 {
            warn!(count = unknown, "unrecognized conflict source, treated as advisory");
        }

        let (blocking, remote_advisory): (Vec<ConflictItem>, Vec<ConflictItem>) = response
            .conflicts
            .into_iter()
            .filter(|i| !candidate.is_self(i))
            .partition(|i| i.is_blocking());

        debug!(
            local = local.len(),
            blocking = blocking.len(),
            remote_advisory = remote_advisory.len(),
            "conflict check classified"
        );

        if !blocking.is_empty() {
            return Ok(ConflictOutcome {
                blocking: Some(union_by_record(blocking)),
                advisory: Vec::new(),
                remote_failed: false,
            });
        }

        Ok(ConflictOutcome {
            blocking: None,
            advisory: union_by_record(local.into_iter().chain(remote_advisory)),
            remote_failed: false,
        })
    }
}
