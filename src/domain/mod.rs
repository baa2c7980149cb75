//! Core domain layer. No external I/O dependencies.
//!
//! Entities and scheduling rules live here. Dependencies flow inward.

pub mod conflicts;
pub mod entities;
pub mod errors;
pub mod materialize;
pub mod overlap;
pub mod reconcile;
pub mod temporal;

pub use conflicts::{
    ConflictCheckRequest, ConflictCheckResponse, ConflictItem, ConflictOutcome, ConflictReport,
    ConflictSource, OverrideAuditEntry, WeeklySlotOverlap, WriteConflictPayload,
};
pub use entities::{
    DateRange, InventoryDraft, InventoryStatus, InventoryUpdate, Lesson, SlotDay, SlotInventory,
    SlotType, StatusChange, Weekday, WeeklySlot, WeeklySlotDraft, WeeklyStatus,
};
pub use errors::DomainError;
pub use materialize::materialize;
pub use overlap::{WeeklyCandidate, detect_weekly_slot_overlaps, has_overlap};
pub use reconcile::{Reconciled, reconcile};
pub use temporal::{RawDay, normalize_day_of_week, parse_time_to_minutes};
