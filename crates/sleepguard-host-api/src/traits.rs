//! Host adapter traits

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sleepguard_api::{AllowList, IntervalSchedule};
use sleepguard_util::IntervalName;
use thiserror::Error;

/// Errors from host adapter operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Activation failed: {0}")]
    ActivationFailed(String),

    #[error("Deactivation failed: {0}")]
    DeactivationFailed(String),

    #[error("Scheduling failed: {0}")]
    ScheduleFailed(String),

    #[error("Too many monitored intervals (limit {limit})")]
    ResourceLimit { limit: usize },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Whether the user has granted the app permission to block apps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotDetermined,
    Denied,
    Approved,
}

impl AuthorizationStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, AuthorizationStatus::Approved)
    }
}

/// Device-level app/site blocking.
///
/// Both operations are idempotent. `activate` recomputes the full rule set
/// from the allow-list and replaces whatever was applied before.
pub trait EnforcementGate: Send + Sync {
    /// Block everything except the allow-list
    fn activate(&self, allow_list: &AllowList) -> HostResult<()>;

    /// Remove all blocking rules
    fn deactivate(&self) -> HostResult<()>;

    /// Whether blocking rules are currently applied
    fn is_active(&self) -> bool;
}

/// Scheduler for named start/end wake-ups that outlive the calling process.
///
/// Scheduling a name that is already registered replaces the registration.
pub trait IntervalMonitor: Send + Sync {
    /// Register `name` for the given schedule
    fn schedule(&self, name: &IntervalName, schedule: IntervalSchedule) -> HostResult<()>;

    /// Remove the registration for `name` (no-op when absent)
    fn cancel(&self, name: &IntervalName) -> HostResult<()>;
}

/// Permission to control app blocking on this device
#[async_trait]
pub trait AuthorizationProvider: Send + Sync {
    /// Current authorization status
    fn status(&self) -> AuthorizationStatus;

    /// Ask for authorization; fails if the user or platform refuses
    async fn request_authorization(&self) -> HostResult<()>;
}
