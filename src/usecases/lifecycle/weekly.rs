//! Weekly template operations. Overlaps between templates are advisory only.

use super::{SlotLifecycleManager, WeeklySaved, require};
use crate::domain::{
    DomainError, WeeklyCandidate, WeeklySlot, WeeklySlotDraft, WeeklySlotOverlap,
    detect_weekly_slot_overlaps,
};
use crate::ports::ConfirmPrompt;
use tracing::{info, warn};

impl SlotLifecycleManager {
    /// Overlaps `draft` would have with the other active templates. Cheap; safe to call
    /// on every field edit.
    pub fn weekly_overlaps(&self, draft: &WeeklySlotDraft, id: Option<&str>) -> Vec<WeeklySlotOverlap> {
        let snapshot = self.board.snapshot();
        detect_weekly_slot_overlaps(&WeeklyCandidate::from_draft(draft, id), &snapshot.weekly)
    }

    pub async fn create_weekly(&self, draft: WeeklySlotDraft) -> Result<WeeklySaved, DomainError> {
        validate_weekly(&draft)?;
        let overlaps = self.weekly_overlaps(&draft, None);
        let _guard = self.in_flight.try_begin("save weekly slot")?;

        let slot = self.store.create_weekly(&draft).await?;
        self.board.upsert_weekly(slot.clone());
        log_saved(&slot, &overlaps, "weekly slot created");
        Ok(WeeklySaved { slot, overlaps })
    }

    pub async fn update_weekly(
        &self,
        id: &str,
        draft: WeeklySlotDraft,
    ) -> Result<WeeklySaved, DomainError> {
        validate_weekly(&draft)?;
        if self.board.snapshot().weekly_by_id(id).is_none() {
            return Err(DomainError::NotFound(format!("weekly slot {}", id)));
        }
        let overlaps = self.weekly_overlaps(&draft, Some(id));
        let _guard = self.in_flight.try_begin("save weekly slot")?;

        let slot = self.store.update_weekly(id, &draft).await?;
        self.board.upsert_weekly(slot.clone());
        log_saved(&slot, &overlaps, "weekly slot updated");
        Ok(WeeklySaved { slot, overlaps })
    }

    /// `active <-> paused`. No conflict check, no confirmation.
    pub async fn toggle_weekly(&self, id: &str) -> Result<WeeklySlot, DomainError> {
        let current = self
            .board
            .snapshot()
            .weekly_by_id(id)
            .map(|s| s.status)
            .ok_or_else(|| DomainError::NotFound(format!("weekly slot {}", id)))?;
        let _guard = self.in_flight.try_begin("toggle weekly slot")?;

        let slot = self.store.set_weekly_status(id, current.toggled()).await?;
        self.board.upsert_weekly(slot.clone());
        info!(slot_id = %slot.id, status = ?slot.status, "weekly slot toggled");
        Ok(slot)
    }

    /// Hard delete after operator confirmation.
    pub async fn delete_weekly(&self, id: &str) -> Result<(), DomainError> {
        let slot = self
            .board
            .snapshot()
            .weekly_by_id(id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("weekly slot {}", id)))?;
        self.require_confirmation(
            ConfirmPrompt::danger(format!(
                "Delete weekly slot {} {}–{}?",
                slot.day_of_week, slot.start_time, slot.end_time
            ))
            .with_help("This cannot be undone"),
        )
        .await?;
        let _guard = self.in_flight.try_begin("delete weekly slot")?;

        self.store.delete_weekly(id).await?;
        self.board.remove_weekly(id);
        info!(slot_id = %id, "weekly slot deleted");
        Ok(())
    }
}

fn validate_weekly(draft: &WeeklySlotDraft) -> Result<(), DomainError> {
    require("teacherId", &draft.teacher_id)?;
    require("startTime", &draft.start_time)?;
    require("endTime", &draft.end_time)
}

fn log_saved(slot: &WeeklySlot, overlaps: &[WeeklySlotOverlap], msg: &str) {
    if overlaps.is_empty() {
        info!(slot_id = %slot.id, teacher_id = %slot.teacher_id, "{}", msg);
    } else {
        warn!(
            slot_id = %slot.id,
            teacher_id = %slot.teacher_id,
            count = overlaps.len(),
            "{} over overlapping templates",
            msg
        );
    }
}
