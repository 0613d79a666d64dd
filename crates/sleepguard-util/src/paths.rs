//! Default paths for sleepguard components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/sleepguard/config.toml` or `~/.config/sleepguard/config.toml`
//! - Data: `$XDG_DATA_HOME/sleepguard` or `~/.local/share/sleepguard`
//! - Shield rules: `$XDG_RUNTIME_DIR/sleepguard/shield.json` or `/tmp/sleepguard-$USER/shield.json`
//!
//! The data directory holds the store shared by the foreground app and the
//! background monitor, so both must resolve it the same way.

use std::path::{Path, PathBuf};

/// Environment variable for overriding the data directory
pub const SLEEPGUARD_DATA_DIR_ENV: &str = "SLEEPGUARD_DATA_DIR";

/// Environment variable for overriding the config file
pub const SLEEPGUARD_CONFIG_ENV: &str = "SLEEPGUARD_CONFIG";

/// Application subdirectory name
const APP_DIR: &str = "sleepguard";

/// Shared store filename within the data directory
const STORE_FILENAME: &str = "shared.db";

/// Shield rule filename within the runtime directory
const RULES_FILENAME: &str = "shield.json";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$SLEEPGUARD_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/sleepguard/config.toml`
/// 3. `~/.config/sleepguard/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(SLEEPGUARD_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join("config.toml");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml");
    }

    PathBuf::from("/etc").join(APP_DIR).join("config.toml")
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$SLEEPGUARD_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/sleepguard` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/sleepguard` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(SLEEPGUARD_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking SLEEPGUARD_DATA_DIR env var.
/// Used for default values in configs where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Path of the shared store inside a data directory
pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILENAME)
}

/// Get the default shield rules path.
///
/// Order of precedence:
/// 1. `$XDG_RUNTIME_DIR/sleepguard/shield.json` (if XDG_RUNTIME_DIR is set)
/// 2. `/tmp/sleepguard-$USER/shield.json` (fallback)
pub fn default_rules_path() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(RULES_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(RULES_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_contains_sleepguard() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("sleepguard"));
    }

    #[test]
    fn store_path_is_inside_data_dir() {
        let dir = PathBuf::from("/var/lib/sleepguard");
        let db = store_path(&dir);
        assert_eq!(db.parent().unwrap(), dir);
        assert!(db.to_string_lossy().ends_with(".db"));
    }

    #[test]
    fn rules_path_is_json() {
        let path = default_rules_path();
        assert!(path.to_string_lossy().contains("sleepguard"));
        assert_eq!(path.extension().unwrap(), "json");
    }
}
