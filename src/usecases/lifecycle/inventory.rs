//! One-off inventory operations.
//!
//! Creates and edits go through the conflict resolver: lesson overlaps refuse the save,
//! slot overlaps are saved over and audited. Status changes are separate, deliberate calls.

use super::{InventorySaved, SlotLifecycleManager, require};
use crate::domain::entities::parse_date;
use crate::domain::overlap::TimeRange;
use crate::domain::{
    ConflictOutcome, ConflictReport, DomainError, InventoryDraft, InventoryStatus,
    InventoryUpdate, SlotInventory, StatusChange,
};
use crate::ports::ConfirmPrompt;
use crate::usecases::conflict_resolver::InventoryCandidate;
use crate::usecases::in_flight::SessionTicket;
use tracing::{info, warn};

/// Field edit of an existing record. Status is not editable here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEdit {
    pub teacher_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

impl From<&SlotInventory> for InventoryEdit {
    fn from(r: &SlotInventory) -> Self {
        Self {
            teacher_id: r.teacher_id.clone(),
            date: r.date.clone(),
            start_time: r.start_time.clone(),
            end_time: r.end_time.clone(),
        }
    }
}

impl SlotLifecycleManager {
    /// Create a one-off open slot.
    pub async fn create_inventory(&self, draft: InventoryDraft) -> Result<InventorySaved, DomainError> {
        validate_times(&draft.teacher_id, &draft.date, &draft.start_time, &draft.end_time)?;
        if draft.status != InventoryStatus::Open {
            return Err(DomainError::Validation(
                "new one-off slots start open".to_string(),
            ));
        }
        let ticket = self.session.ticket();
        let _guard = self.in_flight.try_begin("save slot")?;

        let snapshot = self.board.snapshot();
        let candidate = InventoryCandidate {
            record_id: None,
            teacher_id: &draft.teacher_id,
            date: &draft.date,
            start_time: &draft.start_time,
            end_time: &draft.end_time,
            linked_lesson_ids: &[],
        };
        let outcome = self.resolver.resolve(&candidate, &snapshot.inventory).await?;
        self.gate(&outcome, &ticket)?;

        let record = self.store.create_inventory(&draft).await?;
        self.after_commit(record, outcome, &ticket, "slot created")
    }

    /// Edit time or teacher of a record. The record's status is carried through unchanged.
    pub async fn update_inventory(
        &self,
        id: &str,
        edit: InventoryEdit,
    ) -> Result<InventorySaved, DomainError> {
        validate_times(&edit.teacher_id, &edit.date, &edit.start_time, &edit.end_time)?;
        let snapshot = self.board.snapshot();
        let current = snapshot
            .inventory_by_id(id)
            .ok_or_else(|| DomainError::NotFound(format!("slot {}", id)))?;
        if current.status == InventoryStatus::Canceled {
            return Err(DomainError::Validation(
                "canceled slots are kept for history and cannot be edited".to_string(),
            ));
        }
        if snapshot.is_pending(id) {
            return Err(DomainError::Busy(format!("reservation of {} pending", id)));
        }
        let ticket = self.session.ticket();
        let _guard = self.in_flight.try_begin("save slot")?;

        let candidate = InventoryCandidate {
            record_id: Some(id),
            teacher_id: &edit.teacher_id,
            date: &edit.date,
            start_time: &edit.start_time,
            end_time: &edit.end_time,
            linked_lesson_ids: &current.lessons,
        };
        let outcome = self.resolver.resolve(&candidate, &snapshot.inventory).await?;
        self.gate(&outcome, &ticket)?;

        let update = InventoryUpdate {
            teacher_id: edit.teacher_id,
            date: edit.date,
            start_time: edit.start_time,
            end_time: edit.end_time,
            status: current.status,
            expected_version: current.version,
        };
        let record = self.store.update_inventory(id, &update).await?;
        if record.status != current.status {
            warn!(
                record_id = %id,
                sent = %current.status,
                returned = %record.status,
                "store changed status on a field edit"
            );
        }
        self.after_commit(record, outcome, &ticket, "slot updated")
    }

    /// `open -> booked`. The record leaves the open set immediately and comes back if the
    /// store refuses.
    pub async fn reserve(
        &self,
        id: &str,
        student_id: Option<&str>,
    ) -> Result<SlotInventory, DomainError> {
        let student = student_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if self.policy.require_student && student.is_none() {
            return Err(DomainError::Validation(
                "select a student before reserving".to_string(),
            ));
        }
        let snapshot = self.board.snapshot();
        let current = snapshot
            .inventory_by_id(id)
            .ok_or_else(|| DomainError::NotFound(format!("slot {}", id)))?;
        check_transition(current.status, InventoryStatus::Booked)?;
        if snapshot.is_pending(id) {
            return Err(DomainError::Busy(format!("reservation of {} pending", id)));
        }
        let _guard = self.in_flight.try_begin("reserve slot")?;

        if self.board.begin_pending(id).is_none() {
            return Err(DomainError::NotFound(format!("slot {}", id)));
        }
        let change = StatusChange {
            status: InventoryStatus::Booked,
            student_id: student,
        };
        match self.store.transition_inventory(id, &change).await {
            Ok(record) => {
                info!(record_id = %id, student_id = ?record.student_id, "slot reserved");
                self.board.confirm_pending(record.clone());
                Ok(record)
            }
            Err(e) => {
                warn!(record_id = %id, error = %e, "reservation failed, slot restored");
                self.board.rollback_pending(id);
                Err(e)
            }
        }
    }

    /// `open -> blocked`. No confirmation.
    pub async fn block(&self, id: &str) -> Result<SlotInventory, DomainError> {
        self.transition(id, InventoryStatus::Blocked).await
    }

    /// `blocked -> open`. No confirmation.
    pub async fn unblock(&self, id: &str) -> Result<SlotInventory, DomainError> {
        self.transition(id, InventoryStatus::Open).await
    }

    /// Retire a slot but keep it for history. Asks first.
    pub async fn cancel(&self, id: &str) -> Result<SlotInventory, DomainError> {
        let current = self.current_inventory(id)?;
        check_transition(current.status, InventoryStatus::Canceled)?;
        self.require_confirmation(
            ConfirmPrompt::danger(format!(
                "Cancel slot {} {}–{}?",
                current.date, current.start_time, current.end_time
            ))
            .with_help("It stays in history but can no longer be booked"),
        )
        .await?;
        self.transition(id, InventoryStatus::Canceled).await
    }

    /// Hard delete. Asks first.
    pub async fn delete_inventory(&self, id: &str) -> Result<(), DomainError> {
        let current = self.current_inventory(id)?;
        self.require_confirmation(
            ConfirmPrompt::danger(format!(
                "Delete slot {} {}–{} permanently?",
                current.date, current.start_time, current.end_time
            ))
            .with_help("This cannot be undone"),
        )
        .await?;
        let _guard = self.in_flight.try_begin("delete slot")?;

        self.store.delete_inventory(id).await?;
        self.board.remove_inventory(id);
        info!(record_id = %id, "slot deleted");
        Ok(())
    }

    fn current_inventory(&self, id: &str) -> Result<SlotInventory, DomainError> {
        self.board
            .snapshot()
            .inventory_by_id(id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("slot {}", id)))
    }

    async fn transition(&self, id: &str, to: InventoryStatus) -> Result<SlotInventory, DomainError> {
        let current = self.current_inventory(id)?;
        check_transition(current.status, to)?;
        let _guard = self.in_flight.try_begin("change slot status")?;

        let change = StatusChange {
            status: to,
            student_id: None,
        };
        let record = self.store.transition_inventory(id, &change).await?;
        self.board.upsert_inventory(record.clone());
        info!(record_id = %id, from = %current.status, to = %record.status, "slot status changed");
        Ok(record)
    }

    /// Refuse on blocking conflicts; drop the result if its edit session was closed.
    fn gate(&self, outcome: &ConflictOutcome, ticket: &SessionTicket) -> Result<(), DomainError> {
        self.session.ensure_current(ticket)?;
        match &outcome.blocking {
            Some(blocking) if !blocking.is_empty() => {
                warn!(count = blocking.len(), "save refused: lesson conflict");
                Err(DomainError::BlockingConflict(ConflictReport::new(
                    blocking.clone(),
                )))
            }
            _ => Ok(()),
        }
    }

    /// The write has happened either way, so overrides are audited either way. A session
    /// closed while the store was busy gets `Superseded`; the board picks the record up on
    /// the next refresh.
    fn after_commit(
        &self,
        record: SlotInventory,
        outcome: ConflictOutcome,
        ticket: &SessionTicket,
        msg: &str,
    ) -> Result<InventorySaved, DomainError> {
        if !outcome.advisory.is_empty() {
            self.emit_override_audit(&record, &outcome.advisory);
        }
        if !self.session.is_current(ticket) {
            warn!(
                record_id = %record.id,
                "{} after its edit session closed, result dropped",
                msg
            );
            return Err(DomainError::Superseded);
        }
        self.board.upsert_inventory(record.clone());
        info!(
            record_id = %record.id,
            teacher_id = %record.teacher_id,
            date = %record.date,
            advisory = outcome.advisory.len(),
            "{}",
            msg
        );
        Ok(InventorySaved {
            record,
            overridden: outcome.advisory,
            check_skipped: outcome.remote_failed,
        })
    }
}

fn check_transition(from: InventoryStatus, to: InventoryStatus) -> Result<(), DomainError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(DomainError::InvalidTransition { from, to })
    }
}

fn validate_times(teacher_id: &str, date: &str, start: &str, end: &str) -> Result<(), DomainError> {
    require("teacherId", teacher_id)?;
    require("date", date)?;
    require("startTime", start)?;
    require("endTime", end)?;
    if parse_date(date).is_none() {
        return Err(DomainError::Validation(format!(
            "date must be YYYY-MM-DD, got {:?}",
            date
        )));
    }
    match TimeRange::on_date(date, start, end) {
        None => Err(DomainError::Validation(format!(
            "times must be HH:MM, got {:?}–{:?}",
            start, end
        ))),
        Some(r) if r.is_empty() => Err(DomainError::Validation(
            "endTime must be after startTime".to_string(),
        )),
        Some(_) => Ok(()),
    }
}
