//! sleepguardd - The sleepguard background monitor
//!
//! This is the entry point for the process that enforces registered
//! intervals while the foreground app is not running. It wires together:
//! - Configuration loading
//! - The shared store
//! - The shield rules gate (Linux)
//! - The boundary scheduler and interval reactor

use anyhow::{Context, Result, bail};
use clap::Parser;
use sleepguard_config::{Config, load_config_or_default};
use sleepguard_host_linux::{FileShieldGate, StoreIntervalMonitor};
use sleepguard_store::{AuditEventType, SessionStore, SqliteStore, Store};
use sleepguard_util::default_config_path;
use sleepguardd::BackgroundMonitor;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// sleepguardd - Background monitor for scheduled app blocking
#[derive(Parser, Debug)]
#[command(name = "sleepguardd")]
#[command(about = "Background monitor for scheduled app blocking", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/sleepguard/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set SLEEPGUARD_DATA_DIR env var)
    #[arg(short, long, env = "SLEEPGUARD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Shield rules file override
    #[arg(short, long, env = "SLEEPGUARD_RULES_PATH")]
    rules_path: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Daemon state: configuration plus the monitor it drives
struct Daemon {
    config: Config,
    store: SessionStore,
    monitor: BackgroundMonitor,
}

impl Daemon {
    fn new(args: &Args) -> Result<Self> {
        let mut config = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        if let Some(data_dir) = &args.data_dir {
            config.daemon.data_dir = data_dir.clone();
        }
        if let Some(rules_path) = &args.rules_path {
            config.daemon.rules_path = rules_path.clone();
        }

        info!(
            config_path = %args.config.display(),
            poll_interval_ms = config.daemon.poll_interval.as_millis() as u64,
            "Configuration loaded"
        );

        std::fs::create_dir_all(&config.daemon.data_dir).with_context(|| {
            format!("Failed to create data directory {:?}", config.daemon.data_dir)
        })?;

        let db_path = config.store_path();
        let raw: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );
        if !raw.is_healthy() {
            bail!("Store at {:?} failed its health check", db_path);
        }
        let store = SessionStore::new(raw);

        info!(db_path = %db_path.display(), "Store initialized");

        let gate = Arc::new(FileShieldGate::new(config.daemon.rules_path.clone()));
        info!(rules_path = %gate.path().display(), "Shield gate initialized");

        let intervals = Arc::new(StoreIntervalMonitor::new(store.clone()));
        let monitor =
            BackgroundMonitor::new(store.clone(), gate, intervals, sleepguard_util::now());

        Ok(Self {
            config,
            store,
            monitor,
        })
    }

    async fn run(mut self) -> Result<()> {
        self.store.audit(AuditEventType::MonitorStarted);
        self.monitor.catch_up(sleepguard_util::now());

        // Set up signal handlers
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        let mut tick_timer = tokio::time::interval(self.config.daemon.poll_interval);
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Monitor running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                _ = tick_timer.tick() => {
                    self.monitor.tick(sleepguard_util::now());
                }
            }
        }

        // Rules stay in place: an active interval keeps blocking while the
        // monitor is down, and the next start resumes from the checkpoint.
        info!("Shutting down sleepguardd");
        self.monitor.tick(sleepguard_util::now());
        self.monitor.checkpoint(sleepguard_util::now());
        self.store.audit(AuditEventType::MonitorStopped);

        info!("Shutdown complete");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "sleepguardd starting");

    if sleepguard_util::is_mock_time_active() {
        warn!(now = %sleepguard_util::now(), "Mock time is active");
    }

    let daemon = Daemon::new(&args)?;
    daemon.run().await
}
