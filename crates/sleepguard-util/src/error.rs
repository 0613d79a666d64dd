//! Error types for sleepguard

use thiserror::Error;

/// Core error type for sleepguard operations
#[derive(Debug, Error)]
pub enum SleepguardError {
    #[error("No active session")]
    NoActiveSession,

    #[error("Session already active")]
    SessionAlreadyActive,

    #[error("Invalid session duration: {0} minutes")]
    InvalidDuration(u32),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl SleepguardError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SleepguardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_include_context() {
        let err = SleepguardError::InvalidDuration(0);
        assert_eq!(err.to_string(), "Invalid session duration: 0 minutes");

        let err = SleepguardError::permission("screen time not approved");
        assert_eq!(err.to_string(), "Permission denied: screen time not approved");
    }
}
