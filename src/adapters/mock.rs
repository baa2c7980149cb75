//! Scripted adapters for unit tests.
//!
//! Stand in for the conflict endpoint, the audit sink and the operator confirmation gate.

use crate::domain::{
    ConflictCheckRequest, ConflictCheckResponse, ConflictItem, DomainError, OverrideAuditEntry,
};
use crate::ports::{AuditLogPort, ConfirmPrompt, ConfirmationPort, ConflictCheckPort};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Conflict checker that answers every request with the same script.
pub struct ScriptedConflictCheck {
    answer: Result<Vec<ConflictItem>, String>,
    delay_ms: u64,
    requests: Mutex<Vec<ConflictCheckRequest>>,
}

impl ScriptedConflictCheck {
    pub fn with_conflicts(conflicts: Vec<ConflictItem>) -> Self {
        Self {
            answer: Ok(conflicts),
            delay_ms: 0,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every check fails with `reason`, like a 5xx or a dropped connection.
    pub fn failing(reason: &str) -> Self {
        Self {
            answer: Err(reason.to_string()),
            delay_ms: 0,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Simulated network latency.
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn last_request(&self) -> Option<ConflictCheckRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait::async_trait]
impl ConflictCheckPort for ScriptedConflictCheck {
    async fn check(
        &self,
        request: &ConflictCheckRequest,
    ) -> Result<ConflictCheckResponse, DomainError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        match &self.answer {
            Ok(conflicts) => Ok(ConflictCheckResponse {
                has_conflicts: !conflicts.is_empty(),
                conflicts: conflicts.clone(),
            }),
            Err(reason) => Err(DomainError::ConflictCheck(reason.clone())),
        }
    }
}

/// Audit sink that forwards every entry to a channel and keeps a copy.
pub struct RecordingAuditLog {
    tx: mpsc::UnboundedSender<OverrideAuditEntry>,
    kept: Mutex<Vec<OverrideAuditEntry>>,
    fail: bool,
}

impl RecordingAuditLog {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OverrideAuditEntry>) {
        Self::build(false)
    }

    /// Forwards the entry, then reports failure.
    pub fn failing() -> (Self, mpsc::UnboundedReceiver<OverrideAuditEntry>) {
        Self::build(true)
    }

    fn build(fail: bool) -> (Self, mpsc::UnboundedReceiver<OverrideAuditEntry>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let log = Self {
            tx,
            kept: Mutex::new(Vec::new()),
            fail,
        };
        (log, rx)
    }
}

#[async_trait::async_trait]
impl AuditLogPort for RecordingAuditLog {
    async fn record_override(&self, entry: &OverrideAuditEntry) -> Result<(), DomainError> {
        let _ = self.tx.send(entry.clone());
        if self.fail {
            return Err(DomainError::Audit("audit sink unavailable".to_string()));
        }
        self.kept
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<OverrideAuditEntry>, DomainError> {
        let kept = self.kept.lock().unwrap_or_else(|e| e.into_inner());
        Ok(kept.iter().rev().take(limit).cloned().collect())
    }
}

/// Confirmation gate with a fixed answer. Records the prompts it was shown.
pub struct FixedConfirmation {
    answer: bool,
    prompts: Mutex<Vec<ConfirmPrompt>>,
}

impl FixedConfirmation {
    pub fn yes() -> Self {
        Self::answering(true)
    }

    pub fn no() -> Self {
        Self::answering(false)
    }

    fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<ConfirmPrompt> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl ConfirmationPort for FixedConfirmation {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> Result<bool, DomainError> {
        info!(danger = prompt.danger, answer = self.answer, "[MOCK] {}", prompt.message);
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.clone());
        Ok(self.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conflicts::SLOT_INVENTORY_ENTITY;

    #[tokio::test]
    async fn test_scripted_check_records_requests() {
        let check = ScriptedConflictCheck::with_conflicts(vec![]);
        let req = ConflictCheckRequest {
            entity: SLOT_INVENTORY_ENTITY.into(),
            record_id: None,
            linked_lesson_ids: None,
            teacher_id: "t1".into(),
            date: "2024-05-07".into(),
            start: "10:00".into(),
            end: "11:00".into(),
        };
        let resp = check.check(&req).await.unwrap();
        assert!(!resp.has_conflicts);
        assert_eq!(check.request_count(), 1);
        assert_eq!(check.last_request(), Some(req));
    }

    #[tokio::test]
    async fn test_failing_audit_still_forwards() {
        let (audit, mut rx) = RecordingAuditLog::failing();
        let entry = OverrideAuditEntry::for_inventory("r1", "t1", "2024-05-07", &[]);
        assert!(audit.record_override(&entry).await.is_err());
        assert_eq!(rx.recv().await.map(|e| e.record_id), Some("r1".to_string()));
    }
}
