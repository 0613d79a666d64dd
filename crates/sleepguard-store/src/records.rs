//! Typed access to the shared records
//!
//! Reads never fail: a missing record, an I/O error, or a document that no
//! longer decodes all come back as "absent" (or the record's default).
//! Writes replace the whole record and report errors to the caller.

use chrono::{DateTime, Local};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sleepguard_api::{
    AllowList, MonitoredInterval, RecurringSchedule, Session, StrictnessPolicy,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{AuditEvent, AuditEventType, Store, StoreResult};

/// Record keys in the shared store
pub mod keys {
    pub const ACTIVE_SESSION: &str = "activeSession";
    pub const ALLOWED_APPS: &str = "allowedApps";
    pub const RECURRING_SCHEDULE: &str = "recurringSchedule";
    pub const DEFAULT_STRICTNESS: &str = "defaultStrictness";
    pub const MONITORED_INTERVALS: &str = "monitoredIntervals";
    pub const MONITOR_CHECKPOINT: &str = "monitorCheckpoint";
}

/// Typed facade over the shared key-value store
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn Store>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The underlying raw store
    pub fn raw(&self) -> &Arc<dyn Store> {
        &self.store
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = match self.store.get(key) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read record, treating as absent");
                return None;
            }
        };

        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Failed to decode record, treating as absent");
                None
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let json = serde_json::to_string(value)?;
        self.store.put(key, &json)
    }

    // Active session

    pub fn save_session(&self, session: &Session) -> StoreResult<()> {
        self.save(keys::ACTIVE_SESSION, session)
    }

    pub fn load_session(&self) -> Option<Session> {
        self.load(keys::ACTIVE_SESSION)
    }

    pub fn clear_session(&self) -> StoreResult<()> {
        self.store.delete(keys::ACTIVE_SESSION)
    }

    // Allow-list

    pub fn save_allow_list(&self, allow_list: &AllowList) -> StoreResult<()> {
        self.save(keys::ALLOWED_APPS, allow_list)
    }

    pub fn load_allow_list(&self) -> AllowList {
        self.load(keys::ALLOWED_APPS).unwrap_or_default()
    }

    // Recurring schedule

    pub fn save_schedule(&self, schedule: &RecurringSchedule) -> StoreResult<()> {
        self.save(keys::RECURRING_SCHEDULE, schedule)
    }

    pub fn load_schedule(&self) -> Option<RecurringSchedule> {
        self.load(keys::RECURRING_SCHEDULE)
    }

    /// The saved schedule, or the disabled 22:00-07:00 default
    pub fn load_schedule_or_default(&self) -> RecurringSchedule {
        self.load_schedule().unwrap_or_default()
    }

    pub fn clear_schedule(&self) -> StoreResult<()> {
        self.store.delete(keys::RECURRING_SCHEDULE)
    }

    // Default strictness

    pub fn save_default_strictness(&self, strictness: StrictnessPolicy) -> StoreResult<()> {
        self.save(keys::DEFAULT_STRICTNESS, &strictness)
    }

    pub fn load_default_strictness(&self) -> StrictnessPolicy {
        self.load(keys::DEFAULT_STRICTNESS).unwrap_or_default()
    }

    // Monitored intervals

    pub fn save_intervals(&self, intervals: &[MonitoredInterval]) -> StoreResult<()> {
        self.save(keys::MONITORED_INTERVALS, &intervals)
    }

    pub fn load_intervals(&self) -> Vec<MonitoredInterval> {
        self.load(keys::MONITORED_INTERVALS).unwrap_or_default()
    }

    // Monitor checkpoint

    /// Record that the background monitor has handled every boundary up to `at`
    pub fn save_monitor_checkpoint(&self, at: DateTime<Local>) -> StoreResult<()> {
        self.save(keys::MONITOR_CHECKPOINT, &at)
    }

    pub fn load_monitor_checkpoint(&self) -> Option<DateTime<Local>> {
        self.load(keys::MONITOR_CHECKPOINT)
    }

    // Audit

    /// Record an audit event; failures are logged and otherwise ignored
    pub fn audit(&self, event: AuditEventType) {
        if let Err(e) = self.store.append_audit(AuditEvent::new(event)) {
            debug!(error = %e, "Failed to append audit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteStore;
    use chrono::{Local, TimeZone};
    use sleepguard_api::{AllowKind, IntervalSchedule};
    use sleepguard_util::IntervalName;

    fn make_store() -> SessionStore {
        SessionStore::new(Arc::new(SqliteStore::in_memory().unwrap()))
    }

    #[test]
    fn session_round_trip_and_clear() {
        let store = make_store();
        assert!(store.load_session().is_none());

        let now = Local.with_ymd_and_hms(2025, 12, 25, 21, 0, 0).unwrap();
        let session = Session::manual(60, StrictnessPolicy::Strict, now);
        store.save_session(&session).unwrap();
        assert_eq!(store.load_session(), Some(session));

        store.clear_session().unwrap();
        assert!(store.load_session().is_none());
    }

    #[test]
    fn schedule_and_allow_list_round_trip() {
        let store = make_store();
        assert_eq!(store.load_schedule_or_default(), RecurringSchedule::default());
        assert!(store.load_allow_list().is_empty());

        let schedule = RecurringSchedule {
            enabled: true,
            start_hour: 23,
            start_minute: 15,
            end_hour: 6,
            end_minute: 45,
            strictness: StrictnessPolicy::Strict,
        };
        store.save_schedule(&schedule).unwrap();
        assert_eq!(store.load_schedule(), Some(schedule));

        let mut allow = AllowList::default();
        allow.insert(AllowKind::Application, "com.example.alarm");
        allow.insert(AllowKind::Category, "health");
        store.save_allow_list(&allow).unwrap();
        assert_eq!(store.load_allow_list(), allow);

        store.clear_schedule().unwrap();
        assert!(store.load_schedule().is_none());
    }

    #[test]
    fn default_strictness_defaults_to_flexible() {
        let store = make_store();
        assert_eq!(store.load_default_strictness(), StrictnessPolicy::Flexible);

        store.save_default_strictness(StrictnessPolicy::Strict).unwrap();
        assert_eq!(store.load_default_strictness(), StrictnessPolicy::Strict);
        assert_eq!(
            store.raw().get(keys::DEFAULT_STRICTNESS).unwrap().as_deref(),
            Some("\"strict\"")
        );
    }

    #[test]
    fn corrupt_records_read_as_absent() {
        let store = make_store();
        store.raw().put(keys::ACTIVE_SESSION, "{not json").unwrap();
        store.raw().put(keys::ALLOWED_APPS, "42").unwrap();
        store.raw().put(keys::DEFAULT_STRICTNESS, "\"lenient\"").unwrap();

        assert!(store.load_session().is_none());
        assert!(store.load_allow_list().is_empty());
        assert_eq!(store.load_default_strictness(), StrictnessPolicy::Flexible);
    }

    #[test]
    fn intervals_round_trip() {
        let store = make_store();
        assert!(store.load_intervals().is_empty());

        let start = Local.with_ymd_and_hms(2025, 12, 25, 21, 0, 0).unwrap();
        let intervals = vec![MonitoredInterval {
            name: IntervalName::manual_session(),
            schedule: IntervalSchedule::once(start, start + chrono::Duration::hours(1)),
        }];
        store.save_intervals(&intervals).unwrap();
        assert_eq!(store.load_intervals(), intervals);
    }

    #[test]
    fn audit_appends() {
        let store = make_store();
        store.audit(AuditEventType::ScheduleSaved { enabled: true });
        let events = store.raw().get_recent_audits(5).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, AuditEventType::ScheduleSaved { enabled: true });
    }

    #[test]
    fn monitor_checkpoint_round_trip() {
        let store = make_store();
        assert!(store.load_monitor_checkpoint().is_none());

        let at = Local.with_ymd_and_hms(2025, 12, 25, 22, 0, 0).unwrap();
        store.save_monitor_checkpoint(at).unwrap();
        assert_eq!(store.load_monitor_checkpoint(), Some(at));
    }
}
