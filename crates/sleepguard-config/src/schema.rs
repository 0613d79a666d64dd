//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Background daemon settings
    #[serde(default)]
    pub daemon: RawDaemonConfig,

    /// Foreground session settings
    #[serde(default)]
    pub session: RawSessionConfig,
}

/// Daemon-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawDaemonConfig {
    /// Directory holding the shared store
    pub data_dir: Option<PathBuf>,

    /// Shield rules file watched by the enforcement helper
    pub rules_path: Option<PathBuf>,

    /// How often the daemon checks for interval boundaries
    pub poll_interval_ms: Option<u64>,
}

/// Session settings used by the CLI
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawSessionConfig {
    /// Duration used by `start` when none is given
    pub default_minutes: Option<u32>,

    /// How often the session screen checks for expiry
    pub expiry_poll_seconds: Option<u64>,
}
