//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    ConflictCheckRequest, ConflictCheckResponse, DateRange, DomainError, InventoryDraft,
    InventoryUpdate, OverrideAuditEntry, SlotInventory, StatusChange, WeeklySlot, WeeklySlotDraft,
    WeeklyStatus,
};

/// Record store for weekly templates and dated inventory.
///
/// Every write returns the canonical post-write record; callers replace their local copy
/// with it. A write the store refuses because of an overlapping lesson comes back as
/// `DomainError::WriteConflict`.
#[async_trait::async_trait]
pub trait SlotStorePort: Send + Sync {
    async fn list_weekly(&self) -> Result<Vec<WeeklySlot>, DomainError>;

    async fn create_weekly(&self, draft: &WeeklySlotDraft) -> Result<WeeklySlot, DomainError>;

    async fn update_weekly(
        &self,
        id: &str,
        draft: &WeeklySlotDraft,
    ) -> Result<WeeklySlot, DomainError>;

    async fn set_weekly_status(
        &self,
        id: &str,
        status: WeeklyStatus,
    ) -> Result<WeeklySlot, DomainError>;

    async fn delete_weekly(&self, id: &str) -> Result<(), DomainError>;

    /// Inventory records whose date falls in `range` (inclusive).
    async fn list_inventory(&self, range: &DateRange) -> Result<Vec<SlotInventory>, DomainError>;

    async fn create_inventory(&self, draft: &InventoryDraft)
    -> Result<SlotInventory, DomainError>;

    /// Field edit. `update.status` is the record's current status and must not be read
    /// as a transition.
    async fn update_inventory(
        &self,
        id: &str,
        update: &InventoryUpdate,
    ) -> Result<SlotInventory, DomainError>;

    /// Deliberate status transition.
    async fn transition_inventory(
        &self,
        id: &str,
        change: &StatusChange,
    ) -> Result<SlotInventory, DomainError>;

    async fn delete_inventory(&self, id: &str) -> Result<(), DomainError>;
}

/// Authoritative conflict check. Errors mean "could not determine"; the resolver decides
/// what to do with them.
#[async_trait::async_trait]
pub trait ConflictCheckPort: Send + Sync {
    async fn check(
        &self,
        request: &ConflictCheckRequest,
    ) -> Result<ConflictCheckResponse, DomainError>;
}

/// Sink for advisory-conflict overrides.
#[async_trait::async_trait]
pub trait AuditLogPort: Send + Sync {
    async fn record_override(&self, entry: &OverrideAuditEntry) -> Result<(), DomainError>;

    /// Latest entries, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<OverrideAuditEntry>, DomainError>;
}
