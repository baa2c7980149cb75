//! Override audit as JSON Lines. One entry per line in data/override_audit.jsonl, append-only.

use crate::domain::{DomainError, OverrideAuditEntry};
use crate::ports::AuditLogPort;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

pub struct JsonlAuditLog {
    path: PathBuf,
    /// Serializes appends so concurrent fire-and-forget writes never interleave lines.
    write_lock: Mutex<()>,
}

impl JsonlAuditLog {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            path: base_dir.as_ref().join("override_audit.jsonl"),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl AuditLogPort for JsonlAuditLog {
    async fn record_override(&self, entry: &OverrideAuditEntry) -> Result<(), DomainError> {
        let mut line = serde_json::to_string(entry).map_err(|e| DomainError::Audit(e.to_string()))?;
        line.push('\n');

        let _lock = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Audit(e.to_string()))?;
        }
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| DomainError::Audit(e.to_string()))?;
        f.write_all(line.as_bytes())
            .await
            .map_err(|e| DomainError::Audit(e.to_string()))?;
        f.flush()
            .await
            .map_err(|e| DomainError::Audit(e.to_string()))?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<OverrideAuditEntry>, DomainError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(DomainError::Audit(e.to_string())),
        };
        let mut entries = Vec::new();
        for (n, line) in content.lines().rev().filter(|l| !l.trim().is_empty()).enumerate() {
            if entries.len() >= limit {
                break;
            }
            match serde_json::from_str::<OverrideAuditEntry>(line) {
                Ok(e) => entries.push(e),
                Err(e) => warn!(line_from_end = n, error = %e, "skipping unreadable audit line"),
            }
        }
        Ok(entries)
    }
}
