//! Implements ConfirmationPort with an inquire yes/no prompt.
//!
//! Danger prompts get their own render config (red prompt, default "no") so a destructive
//! question never looks like a routine one.

use crate::domain::DomainError;
use crate::ports::{ConfirmPrompt, ConfirmationPort};
use inquire::Confirm;
use inquire::ui::{Attributes, Color, RenderConfig, StyleSheet, Styled};

pub fn danger_render_config() -> RenderConfig<'static> {
    RenderConfig::default_colored()
        .with_prompt_prefix(Styled::new("!!").with_fg(Color::LightRed))
        .with_answered_prompt_prefix(Styled::new("!!").with_fg(Color::DarkRed))
        .with_default_value(StyleSheet::new().with_fg(Color::LightRed))
        .with_answer(
            StyleSheet::new()
                .with_fg(Color::LightRed)
                .with_attr(Attributes::BOLD),
        )
}

#[derive(Debug, Default)]
pub struct InquireConfirmation;

#[async_trait::async_trait]
impl ConfirmationPort for InquireConfirmation {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> Result<bool, DomainError> {
        let mut question = Confirm::new(&prompt.message).with_default(!prompt.danger);
        if prompt.danger {
            question = question.with_render_config(danger_render_config());
        }
        if let Some(help) = &prompt.help {
            question = question.with_help_message(help);
        }
        match question.prompt() {
            Ok(answer) => Ok(answer),
            Err(
                inquire::InquireError::OperationCanceled
                | inquire::InquireError::OperationInterrupted,
            ) => Ok(false),
            Err(e) => Err(DomainError::Ui(e.to_string())),
        }
    }
}
