//! Override audit sinks.

pub mod jsonl_audit;
pub mod sqlite_audit;

pub use jsonl_audit::JsonlAuditLog;
pub use sqlite_audit::SqliteAuditLog;
