//! Operator confirmation gate. Destructive actions ask before they run.

use crate::domain::DomainError;

/// A yes/no question put to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub message: String,
    /// Destructive action. Rendered with the danger style.
    pub danger: bool,
    /// Consequence line shown under the question.
    pub help: Option<String>,
}

impl ConfirmPrompt {
    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            danger: true,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

#[async_trait::async_trait]
pub trait ConfirmationPort: Send + Sync {
    /// `Ok(true)` to proceed.
    async fn confirm(&self, prompt: &ConfirmPrompt) -> Result<bool, DomainError>;
}
