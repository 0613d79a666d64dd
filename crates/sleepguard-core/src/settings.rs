//! Recurring schedule and preference editing

use sleepguard_api::{AllowKind, AllowList, IntervalSchedule, RecurringSchedule, StrictnessPolicy};
use sleepguard_host_api::IntervalMonitor;
use sleepguard_store::{AuditEventType, SessionStore};
use sleepguard_util::{IntervalName, Result, SleepguardError};
use std::sync::Arc;
use tracing::{info, warn};

use crate::ControllerEvent;
use crate::controller::register_interval;

/// Saves the nightly schedule and keeps its monitor registration in step
pub struct ScheduleSettings {
    store: SessionStore,
    monitor: Arc<dyn IntervalMonitor>,
}

impl ScheduleSettings {
    pub fn new(store: SessionStore, monitor: Arc<dyn IntervalMonitor>) -> Self {
        Self { store, monitor }
    }

    /// The saved schedule, or the disabled 22:00-07:00 default
    pub fn load(&self) -> RecurringSchedule {
        self.store.load_schedule_or_default()
    }

    /// Persist `schedule`, then register the repeating `nightlySchedule`
    /// interval if enabled or cancel it if disabled.
    ///
    /// Invalid times are rejected before anything is written.
    pub fn save(&self, schedule: &RecurringSchedule) -> Result<Vec<ControllerEvent>> {
        let window = schedule
            .validate()
            .map_err(|e| SleepguardError::validation(e.to_string()))?;

        self.store
            .save_schedule(schedule)
            .map_err(|e| SleepguardError::store(e.to_string()))?;

        info!(
            enabled = schedule.enabled,
            window = %IntervalSchedule::daily(window),
            strictness = %schedule.strictness,
            "Schedule saved"
        );
        self.store.audit(AuditEventType::ScheduleSaved {
            enabled: schedule.enabled,
        });

        let name = IntervalName::nightly_schedule();
        if schedule.enabled {
            Ok(register_interval(
                &self.store,
                self.monitor.as_ref(),
                name,
                IntervalSchedule::daily(window),
            )
            .into_iter()
            .collect())
        } else {
            if let Err(e) = self.monitor.cancel(&name) {
                warn!(interval = %name, error = %e, "Failed to cancel nightly interval");
            }
            Ok(Vec::new())
        }
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<Vec<ControllerEvent>> {
        let mut schedule = self.load();
        schedule.enabled = enabled;
        self.save(&schedule)
    }

    /// Flip the enabled flag; returns the new flag with any events
    pub fn toggle_enabled(&self) -> Result<(bool, Vec<ControllerEvent>)> {
        let enabled = !self.load().enabled;
        let events = self.set_enabled(enabled)?;
        Ok((enabled, events))
    }
}

/// Allow-list and default strictness editing
pub struct Preferences {
    store: SessionStore,
}

impl Preferences {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    pub fn allow_list(&self) -> AllowList {
        self.store.load_allow_list()
    }

    /// Exempt `token` from blocking; returns false if it already was
    pub fn allow(&self, kind: AllowKind, token: &str) -> Result<bool> {
        let mut list = self.allow_list();
        let added = list.insert(kind, token);
        if added {
            self.save_allow_list(&list)?;
            info!(kind = ?kind, token, "Added to allow-list");
        }
        Ok(added)
    }

    /// Stop exempting `token`; returns false if it was not listed
    pub fn disallow(&self, kind: AllowKind, token: &str) -> Result<bool> {
        let mut list = self.allow_list();
        let removed = list.remove(kind, token);
        if removed {
            self.save_allow_list(&list)?;
            info!(kind = ?kind, token, "Removed from allow-list");
        }
        Ok(removed)
    }

    pub fn clear_allow_list(&self) -> Result<()> {
        self.save_allow_list(&AllowList::default())?;
        info!("Allow-list cleared");
        Ok(())
    }

    pub fn default_strictness(&self) -> StrictnessPolicy {
        self.store.load_default_strictness()
    }

    pub fn set_default_strictness(&self, strictness: StrictnessPolicy) -> Result<()> {
        self.store
            .save_default_strictness(strictness)
            .map_err(|e| SleepguardError::store(e.to_string()))?;
        info!(strictness = %strictness, "Default strictness saved");
        Ok(())
    }

    fn save_allow_list(&self, list: &AllowList) -> Result<()> {
        self.store
            .save_allow_list(list)
            .map_err(|e| SleepguardError::store(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleepguard_host_api::MockMonitor;
    use sleepguard_store::SqliteStore;
    use sleepguard_util::WallClock;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(SqliteStore::in_memory().unwrap()))
    }

    #[test]
    fn enabling_registers_nightly_interval() {
        let store = store();
        let monitor = Arc::new(MockMonitor::new());
        let settings = ScheduleSettings::new(store.clone(), monitor.clone());

        let mut schedule = settings.load();
        schedule.enabled = true;
        schedule.set_start(WallClock::new(23, 0).unwrap());
        schedule.set_end(WallClock::new(6, 30).unwrap());

        assert!(settings.save(&schedule).unwrap().is_empty());
        assert_eq!(store.load_schedule(), Some(schedule));
        assert_eq!(
            monitor.registered(&IntervalName::nightly_schedule()),
            Some(IntervalSchedule::Daily {
                start: WallClock::new(23, 0).unwrap(),
                end: WallClock::new(6, 30).unwrap(),
            })
        );
    }

    #[test]
    fn disabling_cancels_nightly_interval() {
        let monitor = Arc::new(MockMonitor::new());
        let settings = ScheduleSettings::new(store(), monitor.clone());

        settings.set_enabled(true).unwrap();
        assert!(monitor.registered(&IntervalName::nightly_schedule()).is_some());

        let (enabled, _) = settings.toggle_enabled().unwrap();
        assert!(!enabled);
        assert!(!settings.load().enabled);
        assert!(monitor.registered(&IntervalName::nightly_schedule()).is_none());
        assert_eq!(monitor.cancelled(), vec![IntervalName::nightly_schedule()]);
    }

    #[test]
    fn invalid_schedule_is_not_saved() {
        let store = store();
        let settings = ScheduleSettings::new(store.clone(), Arc::new(MockMonitor::new()));

        let mut schedule = RecurringSchedule::default();
        schedule.start_hour = 25;
        let err = settings.save(&schedule).unwrap_err();
        assert!(matches!(err, SleepguardError::ValidationError(_)));
        assert!(store.load_schedule().is_none());
    }

    #[test]
    fn registration_failure_is_reported() {
        let store = store();
        let monitor = Arc::new(MockMonitor::new());
        *monitor.fail_schedule.lock().unwrap() = true;
        let settings = ScheduleSettings::new(store.clone(), monitor);

        let events = settings.set_enabled(true).unwrap();
        assert!(matches!(
            events.as_slice(),
            [ControllerEvent::MonitoringDegraded { .. }]
        ));
        // The schedule itself is still saved
        assert!(store.load_schedule().unwrap().enabled);
    }

    #[test]
    fn allow_list_edits_persist() {
        let prefs = Preferences::new(store());
        assert!(prefs.allow(AllowKind::Application, "com.example.alarm").unwrap());
        assert!(!prefs.allow(AllowKind::Application, "com.example.alarm").unwrap());
        assert!(prefs.allow(AllowKind::WebDomain, "weather.example").unwrap());
        assert_eq!(prefs.allow_list().len(), 2);

        assert!(prefs.disallow(AllowKind::WebDomain, "weather.example").unwrap());
        assert!(!prefs.disallow(AllowKind::Category, "games").unwrap());

        prefs.clear_allow_list().unwrap();
        assert!(prefs.allow_list().is_empty());
    }

    #[test]
    fn default_strictness_round_trip() {
        let prefs = Preferences::new(store());
        assert_eq!(prefs.default_strictness(), StrictnessPolicy::Flexible);
        prefs.set_default_strictness(StrictnessPolicy::Strict).unwrap();
        assert_eq!(prefs.default_strictness(), StrictnessPolicy::Strict);
    }
}
