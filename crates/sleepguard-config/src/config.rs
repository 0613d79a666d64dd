//! Validated configuration with defaults applied

use crate::schema::{RawConfig, RawDaemonConfig, RawSessionConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Default daemon poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default manual session length, in minutes
pub const DEFAULT_SESSION_MINUTES: u32 = 60;

/// Default expiry check cadence on the session screen
pub const DEFAULT_EXPIRY_POLL: Duration = Duration::from_secs(5);

/// Validated configuration ready for use by the binaries
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub daemon: DaemonConfig,
    pub session: SessionConfig,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            daemon: DaemonConfig::from_raw(raw.daemon),
            session: SessionConfig::from_raw(raw.session),
        }
    }

    /// Location of the shared store
    pub fn store_path(&self) -> PathBuf {
        sleepguard_util::store_path(&self.daemon.data_dir)
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub rules_path: PathBuf,
    pub poll_interval: Duration,
}

impl DaemonConfig {
    fn from_raw(raw: RawDaemonConfig) -> Self {
        Self {
            data_dir: raw
                .data_dir
                .unwrap_or_else(sleepguard_util::default_data_dir),
            rules_path: raw
                .rules_path
                .unwrap_or_else(sleepguard_util::default_rules_path),
            poll_interval: raw
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::from_raw(RawDaemonConfig::default())
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub default_minutes: u32,
    pub expiry_poll: Duration,
}

impl SessionConfig {
    fn from_raw(raw: RawSessionConfig) -> Self {
        Self {
            default_minutes: raw.default_minutes.unwrap_or(DEFAULT_SESSION_MINUTES),
            expiry_poll: raw
                .expiry_poll_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_EXPIRY_POLL),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_raw(RawSessionConfig::default())
    }
}
