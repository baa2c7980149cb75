//! Inbound port. UI (adapter) calls into the application.

use crate::domain::DomainError;

/// Input port: UI/CLI drives the scheduling use cases.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Run the interactive operator console until the operator exits.
    async fn run(&self) -> Result<(), DomainError>;
}
