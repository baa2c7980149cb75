//! Wiring & DI. Entry point: bootstrap adapters, inject into the lifecycle manager, run UI.
//! No business logic here.

use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tutor_slots::adapters::audit::{JsonlAuditLog, SqliteAuditLog};
use tutor_slots::adapters::http::{HttpConflictCheck, HttpSlotStore, RestClient};
use tutor_slots::adapters::persistence::LocalSlotStore;
use tutor_slots::adapters::ui::{InquireConfirmation, TuiInputPort};
use tutor_slots::ports::{AuditLogPort, ConflictCheckPort, InputPort, SlotStorePort};
use tutor_slots::shared::config::{AppConfig, AuditBackend};
use tutor_slots::usecases::{ConflictResolver, LifecyclePolicy, SlotLifecycleManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config not loaded, using defaults");
        AppConfig::default()
    });

    let data_path = PathBuf::from(cfg.data_dir_or_default());
    tokio::fs::create_dir_all(&data_path)
        .await
        .map_err(|e| anyhow::anyhow!("create data dir: {}", e))?;
    info!(path = %data_path.display(), "data directory");

    // --- Record store + conflict check: remote if configured, local JSON otherwise ---
    let (store, checker, store_label): (Arc<dyn SlotStorePort>, Arc<dyn ConflictCheckPort>, String) =
        match cfg.store_url() {
            Some(base) => {
                let timeout = Duration::from_secs(cfg.request_timeout_secs_or_default());
                let rest = RestClient::new(base, cfg.api_token.clone(), timeout)
                    .map_err(|e| anyhow::anyhow!("{}", e))?;
                let check_url = cfg
                    .conflict_check_url_or_default()
                    .unwrap_or_else(|| rest.url("conflicts/check"));
                info!(store = %base, conflict_check = %check_url, "remote record store");
                let store: Arc<dyn SlotStorePort> = Arc::new(HttpSlotStore::new(rest.clone()));
                let checker: Arc<dyn ConflictCheckPort> =
                    Arc::new(HttpConflictCheck::new(rest, check_url));
                (store, checker, base.to_string())
            }
            None => {
                let path = data_path.join("slots.json");
                let local = Arc::new(LocalSlotStore::new(&path));
                local.load().await.map_err(|e| anyhow::anyhow!("{}", e))?;
                info!(path = %path.display(), "local record store");
                let store: Arc<dyn SlotStorePort> = local.clone();
                let checker: Arc<dyn ConflictCheckPort> = local;
                (store, checker, format!("local ({})", path.display()))
            }
        };

    // --- Override audit sink ---
    let audit: Arc<dyn AuditLogPort> = match cfg.audit_backend_or_default() {
        AuditBackend::Sqlite => {
            let log = SqliteAuditLog::connect(&data_path)
                .await
                .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?;
            info!(path = %log.path().display(), "override audit: sqlite");
            Arc::new(log)
        }
        AuditBackend::Jsonl => {
            let log = JsonlAuditLog::new(&data_path);
            info!(path = %log.path().display(), "override audit: jsonl");
            Arc::new(log)
        }
    };

    tutor_slots::adapters::ui::init_ui(&store_label);

    let policy = LifecyclePolicy {
        require_student: cfg.require_student_or_default(),
    };
    let manager = Arc::new(SlotLifecycleManager::new(
        store,
        ConflictResolver::new(checker),
        audit,
        Arc::new(InquireConfirmation),
        policy,
    ));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        manager,
        cfg.inventory_window_days_or_default(),
    ));

    // --- Run (main menu -> weekly templates / one-off slots / materialize / audit) ---
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
