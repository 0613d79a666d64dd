//! Configuration validation

use crate::schema::RawConfig;
use sleepguard_api::{MAX_SESSION_MINUTES, MIN_SESSION_MINUTES};
use std::path::Path;
use thiserror::Error;

/// Fastest allowed daemon poll
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Slowest allowed daemon poll
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// Slowest allowed expiry poll on the session screen
pub const MAX_EXPIRY_POLL_SECONDS: u64 = 300;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: {value} out of range ({min}-{max})")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("{field}: path cannot be empty")]
    EmptyPath { field: &'static str },

    #[error("{field}: path must be absolute, got '{path}'")]
    RelativePath { field: &'static str, path: String },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(path) = &config.daemon.data_dir {
        errors.extend(validate_path("daemon.data_dir", path));
    }
    if let Some(path) = &config.daemon.rules_path {
        errors.extend(validate_path("daemon.rules_path", path));
    }

    if let Some(ms) = config.daemon.poll_interval_ms {
        errors.extend(check_range(
            "daemon.poll_interval_ms",
            ms,
            MIN_POLL_INTERVAL_MS,
            MAX_POLL_INTERVAL_MS,
        ));
    }

    if let Some(minutes) = config.session.default_minutes {
        errors.extend(check_range(
            "session.default_minutes",
            minutes as u64,
            MIN_SESSION_MINUTES as u64,
            MAX_SESSION_MINUTES as u64,
        ));
    }

    if let Some(secs) = config.session.expiry_poll_seconds {
        errors.extend(check_range(
            "session.expiry_poll_seconds",
            secs,
            1,
            MAX_EXPIRY_POLL_SECONDS,
        ));
    }

    errors
}

fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Option<ValidationError> {
    if (min..=max).contains(&value) {
        None
    } else {
        Some(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn validate_path(field: &'static str, path: &Path) -> Option<ValidationError> {
    if path.as_os_str().is_empty() {
        Some(ValidationError::EmptyPath { field })
    } else if !path.is_absolute() {
        Some(ValidationError::RelativePath {
            field,
            path: path.display().to_string(),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawDaemonConfig, RawSessionConfig};
    use std::path::PathBuf;

    fn raw(daemon: RawDaemonConfig, session: RawSessionConfig) -> RawConfig {
        RawConfig {
            config_version: 1,
            daemon,
            session,
        }
    }

    #[test]
    fn empty_config_is_valid() {
        assert!(validate_config(&raw(Default::default(), Default::default())).is_empty());
    }

    #[test]
    fn reports_every_problem() {
        let config = raw(
            RawDaemonConfig {
                data_dir: Some(PathBuf::from("relative/dir")),
                rules_path: Some(PathBuf::new()),
                poll_interval_ms: Some(10),
            },
            RawSessionConfig {
                default_minutes: Some(0),
                expiry_poll_seconds: Some(5),
            },
        );

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::EmptyPath {
            field: "daemon.rules_path"
        }));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::OutOfRange { field: "session.default_minutes", value: 0, .. }
        )));
    }

    #[test]
    fn session_minutes_upper_bound() {
        let config = raw(
            Default::default(),
            RawSessionConfig {
                default_minutes: Some(MAX_SESSION_MINUTES + 1),
                expiry_poll_seconds: None,
            },
        );
        assert_eq!(validate_config(&config).len(), 1);
    }
}
