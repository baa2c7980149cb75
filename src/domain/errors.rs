//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use super::conflicts::ConflictReport;
use super::entities::InventoryStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Missing or malformed input. Raised before any I/O.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Overlap with a committed lesson. The save was refused.
    #[error("Blocked by conflicting lesson(s): {0}")]
    BlockingConflict(ConflictReport),

    /// 409 / CONFLICT_ERROR returned by the record store on write.
    #[error("Record store refused the write: {0}")]
    WriteConflict(ConflictReport),

    #[error("Record {record_id} changed since you loaded it")]
    StaleRecord { record_id: String },

    #[error("Cannot move slot from {from} to {to}")]
    InvalidTransition {
        from: InventoryStatus,
        to: InventoryStatus,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Another request for the same action is still pending.
    #[error("Busy: {0}")]
    Busy(String),

    /// The edit session this result belongs to was closed.
    #[error("Result discarded: edit session was closed")]
    Superseded,

    #[error("Cancelled by operator")]
    Declined,

    #[error("Record store error: {0}")]
    Store(String),

    #[error("Conflict check error: {0}")]
    ConflictCheck(String),

    #[error("Audit log error: {0}")]
    Audit(String),

    #[error("UI error: {0}")]
    Ui(String),
}

impl DomainError {
    /// Errors reported inline while the form stays editable.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            DomainError::Validation(_)
                | DomainError::BlockingConflict(_)
                | DomainError::Busy(_)
                | DomainError::Superseded
                | DomainError::Declined
        )
    }
}
