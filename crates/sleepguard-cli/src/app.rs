//! Shared wiring for CLI commands

use anyhow::{Context, Result};
use sleepguard_config::Config;
use sleepguard_core::{CountdownTick, Preferences, ScheduleSettings, SessionController};
use sleepguard_host_api::{AuthorizationProvider, AuthorizationStatus};
use sleepguard_host_linux::{FileShieldGate, LocalAuthorization, StoreIntervalMonitor};
use sleepguard_store::{SessionStore, SqliteStore, Store};
use sleepguard_util::SleepguardError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Collaborators shared by every command
pub struct App {
    pub config: Config,
    pub store: SessionStore,
    pub gate: Arc<FileShieldGate>,
    pub monitor: Arc<StoreIntervalMonitor>,
    pub auth: LocalAuthorization,
}

impl App {
    pub fn open(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.daemon.data_dir).with_context(|| {
            format!("Failed to create data directory {:?}", config.daemon.data_dir)
        })?;

        let db_path = config.store_path();
        let raw: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );
        debug!(db_path = %db_path.display(), "Store opened");

        let store = SessionStore::new(raw);
        let gate = Arc::new(FileShieldGate::new(config.daemon.rules_path.clone()));
        let monitor = Arc::new(StoreIntervalMonitor::new(store.clone()));
        let auth = LocalAuthorization::for_rules_path(&config.daemon.rules_path);

        Ok(Self {
            config,
            store,
            gate,
            monitor,
            auth,
        })
    }

    /// A controller plus the receiving end of its countdown channel
    pub fn controller(&self) -> (SessionController, mpsc::UnboundedReceiver<CountdownTick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = SessionController::new(
            self.store.clone(),
            self.gate.clone(),
            self.monitor.clone(),
            tx,
        );
        (controller, rx)
    }

    pub fn schedule_settings(&self) -> ScheduleSettings {
        ScheduleSettings::new(self.store.clone(), self.monitor.clone())
    }

    pub fn preferences(&self) -> Preferences {
        Preferences::new(self.store.clone())
    }

    /// Fail unless blocking has been authorized
    pub fn require_authorization(&self) -> Result<()> {
        match self.auth.status() {
            AuthorizationStatus::Approved => Ok(()),
            status => {
                info!(status = ?status, "Blocking not authorized");
                Err(SleepguardError::permission(
                    "blocking is not authorized; run `sleepguard authorize` and try again",
                )
                .into())
            }
        }
    }

    pub async fn authorize(&self) -> Result<AuthorizationStatus> {
        if !self.auth.status().is_approved() {
            self.auth
                .request_authorization()
                .await
                .map_err(|e| SleepguardError::permission(e.to_string()))?;
        }
        Ok(self.auth.status())
    }
}
