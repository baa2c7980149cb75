//! Application use cases. Orchestrate domain logic via ports.

pub mod conflict_resolver;
pub mod in_flight;
pub mod lifecycle;
pub mod slot_board;

pub use conflict_resolver::ConflictResolver;
pub use lifecycle::{LifecyclePolicy, SlotLifecycleManager};
pub use slot_board::{BoardSnapshot, SlotBoard};
