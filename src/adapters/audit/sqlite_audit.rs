//! SQLite-backed override audit via libsql. One `override_audit` table in data/audit.db.

use crate::domain::{DomainError, OverrideAuditEntry};
use crate::ports::AuditLogPort;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use std::path::{Path, PathBuf};
use tracing::info;

const OVERRIDE_AUDIT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS override_audit (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    record_id TEXT NOT NULL,
    entity TEXT NOT NULL,
    teacher_id TEXT NOT NULL,
    date TEXT NOT NULL,
    conflict_summary TEXT NOT NULL,
    recorded_at TEXT NOT NULL
)"#;
const OVERRIDE_AUDIT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_override_audit_teacher ON override_audit (teacher_id, date)";

fn audit_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Audit(e.to_string())
}

pub struct SqliteAuditLog {
    db: Database,
    db_path: PathBuf,
}

impl SqliteAuditLog {
    /// Connect to (or create) `audit.db` under `base_dir` and ensure the schema exists.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(audit_err)?;
        let db_path = base.join("audit.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(audit_err)?;
        let conn = db.connect().map_err(audit_err)?;

        // PRAGMA returns a row; consume it (execute fails when rows are returned).
        let mut wal_rows = conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::Audit(format!("WAL pragma failed: {}", e)))?;
        while wal_rows.next().await.map_err(audit_err)?.is_some() {}

        conn.execute(OVERRIDE_AUDIT_TABLE, ())
            .await
            .map_err(audit_err)?;
        conn.execute(OVERRIDE_AUDIT_INDEX, ())
            .await
            .map_err(audit_err)?;

        info!(path = %db_path.display(), "override audit log opened");
        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<Connection, DomainError> {
        self.db.connect().map_err(audit_err)
    }
}

#[async_trait::async_trait]
impl AuditLogPort for SqliteAuditLog {
    async fn record_override(&self, entry: &OverrideAuditEntry) -> Result<(), DomainError> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO override_audit
                (record_id, entity, teacher_id, date, conflict_summary, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.record_id.as_str(),
                entry.entity.as_str(),
                entry.teacher_id.as_str(),
                entry.date.as_str(),
                entry.conflict_summary.as_str(),
                entry.recorded_at.to_rfc3339()
            ],
        )
        .await
        .map_err(audit_err)?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<OverrideAuditEntry>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                r#"
                SELECT record_id, entity, teacher_id, date, conflict_summary, recorded_at
                FROM override_audit
                ORDER BY seq DESC
                LIMIT ?1
                "#,
                params![limit as i64],
            )
            .await
            .map_err(audit_err)?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await.map_err(audit_err)? {
            let recorded_at: String = row.get(5).map_err(audit_err)?;
            entries.push(OverrideAuditEntry {
                record_id: row.get(0).map_err(audit_err)?,
                entity: row.get(1).map_err(audit_err)?,
                teacher_id: row.get(2).map_err(audit_err)?,
                date: row.get(3).map_err(audit_err)?,
                conflict_summary: row.get(4).map_err(audit_err)?,
                recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(audit_err)?,
            });
        }
        Ok(entries)
    }
}
