//! Slot lifecycle manager. Owns the working set and every state change of a slot.
//!
//! - Weekly templates: create / edit with advisory overlaps, pause toggle, delete
//! - One-off inventory: create / edit through the conflict resolver, reserve,
//!   block / unblock, cancel, delete
//! - Refresh and materialization merge store results through the reconciler
//!
//! Writes are single-flight: a second write while one is pending fails with `Busy`.
//! Nothing outside this manager mutates the board.

mod inventory;
mod weekly;

#[cfg(test)]
mod tests;

use crate::domain::reconcile::reconcile;
use crate::domain::{
    ConflictItem, DateRange, DomainError, InventoryDraft, OverrideAuditEntry, SlotInventory,
    WeeklySlot, WeeklySlotOverlap, materialize,
};
use crate::ports::{AuditLogPort, ConfirmPrompt, ConfirmationPort, SlotStorePort};
use crate::usecases::conflict_resolver::ConflictResolver;
use crate::usecases::in_flight::{EditSession, InFlight, SessionTicket};
use crate::usecases::slot_board::{BoardSnapshot, SlotBoard};
use std::sync::Arc;
use tracing::{info, warn};

pub use inventory::InventoryEdit;

/// Operator-facing policy knobs.
#[derive(Debug, Clone, Copy)]
pub struct LifecyclePolicy {
    /// Reservation needs a non-empty student selection.
    pub require_student: bool,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            require_student: true,
        }
    }
}

/// Weekly template saved, with the overlaps it was saved over.
#[derive(Debug, Clone)]
pub struct WeeklySaved {
    pub slot: WeeklySlot,
    pub overlaps: Vec<WeeklySlotOverlap>,
}

/// Inventory record saved, with the advisory conflicts that were overridden.
#[derive(Debug, Clone)]
pub struct InventorySaved {
    pub record: SlotInventory,
    pub overridden: Vec<ConflictItem>,
    /// The proactive check could not run; the save went ahead without it.
    pub check_skipped: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub weekly: usize,
    pub inventory: usize,
    pub duplicates_dropped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MaterializeReport {
    pub created: Vec<SlotInventory>,
    /// Drafts the store refused, with the reason.
    pub skipped: Vec<(InventoryDraft, String)>,
}

pub struct SlotLifecycleManager {
    store: Arc<dyn SlotStorePort>,
    resolver: ConflictResolver,
    audit: Arc<dyn AuditLogPort>,
    confirm: Arc<dyn ConfirmationPort>,
    board: SlotBoard,
    session: EditSession,
    in_flight: InFlight,
    policy: LifecyclePolicy,
}

impl SlotLifecycleManager {
    pub fn new(
        store: Arc<dyn SlotStorePort>,
        resolver: ConflictResolver,
        audit: Arc<dyn AuditLogPort>,
        confirm: Arc<dyn ConfirmationPort>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            store,
            resolver,
            audit,
            confirm,
            board: SlotBoard::new(),
            session: EditSession::new(),
            in_flight: InFlight::new(),
            policy,
        }
    }

    /// Consistent view of the working set.
    pub fn snapshot(&self) -> Arc<BoardSnapshot> {
        self.board.snapshot()
    }

    pub fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy() || self.resolver.is_checking()
    }

    /// Open an edit form for `record_id` (`None` for a new record).
    pub fn open_session(&self, record_id: Option<&str>) -> SessionTicket {
        self.session.open(record_id)
    }

    /// Close the edit form. Pending checks and commits issued from it are discarded.
    pub fn close_session(&self) {
        self.session.close();
    }

    /// Fetch both collections, reconcile, and replace the board.
    pub async fn refresh(&self, window: &DateRange) -> Result<RefreshReport, DomainError> {
        let _guard = self.in_flight.try_begin("refresh")?;
        let (weekly, inventory) = tokio::try_join!(
            self.store.list_weekly(),
            self.store.list_inventory(window)
        )?;
        let weekly = reconcile(weekly);
        let inventory = reconcile(inventory);
        let report = RefreshReport {
            weekly: weekly.records.len(),
            inventory: inventory.records.len(),
            duplicates_dropped: weekly.dropped.len() + inventory.dropped.len(),
        };
        self.board.replace(weekly.records, inventory.records);
        info!(
            weekly = report.weekly,
            inventory = report.inventory,
            duplicates = report.duplicates_dropped,
            from = %window.from,
            to = %window.to,
            "board refreshed"
        );
        Ok(report)
    }

    /// Expand active templates over `range` and commit the drafts. Dates the teacher
    /// already covers are skipped, so repeated runs are safe.
    pub async fn materialize_range(
        &self,
        range: &DateRange,
    ) -> Result<MaterializeReport, DomainError> {
        let _guard = self.in_flight.try_begin("materialize")?;
        let existing = reconcile(self.store.list_inventory(range).await?).records;
        let drafts = materialize(&self.board.snapshot().weekly, range, &existing);

        let mut report = MaterializeReport::default();
        for draft in drafts {
            match self.store.create_inventory(&draft).await {
                Ok(record) => report.created.push(record),
                Err(e @ DomainError::WriteConflict(_)) => {
                    warn!(
                        date = %draft.date,
                        teacher_id = %draft.teacher_id,
                        error = %e,
                        "materialized slot refused by store"
                    );
                    report.skipped.push((draft, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }
        self.board.extend_inventory(existing);
        self.board.extend_inventory(report.created.clone());
        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            "templates materialized"
        );
        Ok(report)
    }

    /// Latest override-audit entries, newest first.
    pub async fn recent_overrides(
        &self,
        limit: usize,
    ) -> Result<Vec<OverrideAuditEntry>, DomainError> {
        self.audit.recent(limit).await
    }

    /// Yes/no gate. `Declined` if the operator says no.
    async fn require_confirmation(&self, prompt: ConfirmPrompt) -> Result<(), DomainError> {
        if self.confirm.confirm(&prompt).await? {
            Ok(())
        } else {
            Err(DomainError::Declined)
        }
    }

    /// Fire-and-forget. Audit failures are logged and never reach the caller.
    fn emit_override_audit(&self, record: &SlotInventory, overridden: &[ConflictItem]) {
        let entry =
            OverrideAuditEntry::for_inventory(&record.id, &record.teacher_id, &record.date, overridden);
        info!(
            record_id = %entry.record_id,
            teacher_id = %entry.teacher_id,
            date = %entry.date,
            summary = %entry.conflict_summary,
            "advisory conflicts overridden"
        );
        let audit = Arc::clone(&self.audit);
        tokio::spawn(async move {
            if let Err(e) = audit.record_override(&entry).await {
                warn!(record_id = %entry.record_id, error = %e, "override audit not recorded");
            }
        });
    }
}

fn require(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        Err(DomainError::Validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}
