//! Mock host adapters for testing

use async_trait::async_trait;
use sleepguard_api::{AllowList, IntervalSchedule};
use sleepguard_util::IntervalName;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::{
    AuthorizationProvider, AuthorizationStatus, EnforcementGate, HostError, HostResult,
    IntervalMonitor, ShieldRules,
};

/// A call observed by [`MockGate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateCall {
    Activate(AllowList),
    Deactivate,
}

/// In-memory enforcement gate recording every call
pub struct MockGate {
    rules: Arc<Mutex<Option<ShieldRules>>>,
    calls: Arc<Mutex<Vec<GateCall>>>,

    /// Configure activate to fail
    pub fail_activate: Arc<Mutex<bool>>,
}

impl MockGate {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_activate: Arc::new(Mutex::new(false)),
        }
    }

    /// Currently applied rules, if any
    pub fn rules(&self) -> Option<ShieldRules> {
        self.rules.lock().unwrap().clone()
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<GateCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Simulate the platform clearing rules behind the app's back
    pub fn clear_externally(&self) {
        *self.rules.lock().unwrap() = None;
    }
}

impl Default for MockGate {
    fn default() -> Self {
        Self::new()
    }
}

impl EnforcementGate for MockGate {
    fn activate(&self, allow_list: &AllowList) -> HostResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(GateCall::Activate(allow_list.clone()));

        if *self.fail_activate.lock().unwrap() {
            return Err(HostError::ActivationFailed("Mock activation failure".into()));
        }

        *self.rules.lock().unwrap() = Some(ShieldRules::from_allow_list(allow_list));
        Ok(())
    }

    fn deactivate(&self) -> HostResult<()> {
        self.calls.lock().unwrap().push(GateCall::Deactivate);
        *self.rules.lock().unwrap() = None;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.rules.lock().unwrap().is_some()
    }
}

/// In-memory interval monitor
pub struct MockMonitor {
    intervals: Arc<Mutex<BTreeMap<IntervalName, IntervalSchedule>>>,
    cancelled: Arc<Mutex<Vec<IntervalName>>>,

    /// Configure schedule to fail
    pub fail_schedule: Arc<Mutex<bool>>,
}

impl MockMonitor {
    pub fn new() -> Self {
        Self {
            intervals: Arc::new(Mutex::new(BTreeMap::new())),
            cancelled: Arc::new(Mutex::new(Vec::new())),
            fail_schedule: Arc::new(Mutex::new(false)),
        }
    }

    /// Registration for `name`, if any
    pub fn registered(&self, name: &IntervalName) -> Option<IntervalSchedule> {
        self.intervals.lock().unwrap().get(name).cloned()
    }

    pub fn registration_count(&self) -> usize {
        self.intervals.lock().unwrap().len()
    }

    /// Names passed to `cancel`, oldest first
    pub fn cancelled(&self) -> Vec<IntervalName> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl Default for MockMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalMonitor for MockMonitor {
    fn schedule(&self, name: &IntervalName, schedule: IntervalSchedule) -> HostResult<()> {
        if *self.fail_schedule.lock().unwrap() {
            return Err(HostError::ScheduleFailed("Mock schedule failure".into()));
        }
        self.intervals.lock().unwrap().insert(name.clone(), schedule);
        Ok(())
    }

    fn cancel(&self, name: &IntervalName) -> HostResult<()> {
        self.intervals.lock().unwrap().remove(name);
        self.cancelled.lock().unwrap().push(name.clone());
        Ok(())
    }
}

/// Authorization provider with a scripted outcome
pub struct MockAuthorization {
    status: Arc<Mutex<AuthorizationStatus>>,

    /// Whether `request_authorization` succeeds
    pub grant_on_request: Arc<Mutex<bool>>,
}

impl MockAuthorization {
    pub fn new(status: AuthorizationStatus) -> Self {
        Self {
            status: Arc::new(Mutex::new(status)),
            grant_on_request: Arc::new(Mutex::new(true)),
        }
    }

    pub fn approved() -> Self {
        Self::new(AuthorizationStatus::Approved)
    }
}

#[async_trait]
impl AuthorizationProvider for MockAuthorization {
    fn status(&self) -> AuthorizationStatus {
        *self.status.lock().unwrap()
    }

    async fn request_authorization(&self) -> HostResult<()> {
        if *self.grant_on_request.lock().unwrap() {
            *self.status.lock().unwrap() = AuthorizationStatus::Approved;
            Ok(())
        } else {
            *self.status.lock().unwrap() = AuthorizationStatus::Denied;
            Err(HostError::PermissionDenied("Mock authorization refused".into()))
        }
    }
}
