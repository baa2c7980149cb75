//! Application configuration. Store endpoints, paths, operator policy.

use crate::domain::entities::MAX_RANGE_DAYS;
use serde::Deserialize;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_INVENTORY_WINDOW_DAYS: i64 = 14;

/// Where override audits go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditBackend {
    #[default]
    Sqlite,
    Jsonl,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Base URL of the remote record store. Unset means the local JSON store.
    /// Read from TUTOR_SLOTS_STORE_URL.
    #[serde(default)]
    pub store_url: Option<String>,

    /// Bearer token for the record store and the conflict endpoint.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Conflict Check endpoint. Defaults to `{store_url}/conflicts/check`.
    #[serde(default)]
    pub conflict_check_url: Option<String>,

    #[serde(default)]
    pub data_dir: Option<String>,

    #[serde(default)]
    pub audit_backend: Option<AuditBackend>,

    /// Reservation needs a student. Defaults to true.
    #[serde(default)]
    pub require_student: Option<bool>,

    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Days of inventory loaded on refresh, starting today.
    #[serde(default)]
    pub inventory_window_days: Option<i64>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("TUTOR_SLOTS").try_parsing(true));
        if let Ok(path) = std::env::var("TUTOR_SLOTS_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Remote store URL, if one is configured and non-empty.
    pub fn store_url(&self) -> Option<&str> {
        self.store_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn conflict_check_url_or_default(&self) -> Option<String> {
        self.conflict_check_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                self.store_url()
                    .map(|base| format!("{}/conflicts/check", base.trim_end_matches('/')))
            })
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir
            .clone()
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
    }

    pub fn audit_backend_or_default(&self) -> AuditBackend {
        self.audit_backend.unwrap_or_default()
    }

    pub fn require_student_or_default(&self) -> bool {
        self.require_student.unwrap_or(true)
    }

    pub fn request_timeout_secs_or_default(&self) -> u64 {
        self.request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// Clamped to `1..=MAX_RANGE_DAYS`.
    pub fn inventory_window_days_or_default(&self) -> i64 {
        self.inventory_window_days
            .unwrap_or(DEFAULT_INVENTORY_WINDOW_DAYS)
            .clamp(1, MAX_RANGE_DAYS)
    }
}
