//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by UI/adapter into the application
//! - Outbound: Called by application into infrastructure

pub mod confirm;
pub mod inbound;
pub mod outbound;

pub use confirm::{ConfirmPrompt, ConfirmationPort};
pub use inbound::InputPort;
pub use outbound::{AuditLogPort, ConflictCheckPort, SlotStorePort};
