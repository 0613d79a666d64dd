//! Store-backed interval monitor
//!
//! Registrations live in the `monitoredIntervals` record so the daemon,
//! running as a separate process, sees what the foreground registered.

use sleepguard_api::{IntervalSchedule, MonitoredInterval};
use sleepguard_host_api::{HostError, HostResult, IntervalMonitor};
use sleepguard_store::SessionStore;
use sleepguard_util::IntervalName;
use std::sync::Mutex;
use tracing::{debug, info};

/// Most distinct interval names that may be registered at once
pub const MAX_MONITORED_INTERVALS: usize = 20;

/// Interval monitor persisting registrations in the shared store
pub struct StoreIntervalMonitor {
    store: SessionStore,
    // Serialises read-modify-write of the record within this process
    lock: Mutex<()>,
}

impl StoreIntervalMonitor {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Everything currently registered
    pub fn registrations(&self) -> Vec<MonitoredInterval> {
        self.store.load_intervals()
    }

    fn update<F>(&self, f: F) -> HostResult<()>
    where
        F: FnOnce(&mut Vec<MonitoredInterval>) -> HostResult<bool>,
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| HostError::Internal("interval monitor lock poisoned".into()))?;

        let mut intervals = self.store.load_intervals();
        if f(&mut intervals)? {
            self.store
                .save_intervals(&intervals)
                .map_err(|e| HostError::ScheduleFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl IntervalMonitor for StoreIntervalMonitor {
    fn schedule(&self, name: &IntervalName, schedule: IntervalSchedule) -> HostResult<()> {
        self.update(|intervals| {
            if let Some(existing) = intervals.iter_mut().find(|i| &i.name == name) {
                existing.schedule = schedule.clone();
            } else {
                if intervals.len() >= MAX_MONITORED_INTERVALS {
                    return Err(HostError::ResourceLimit {
                        limit: MAX_MONITORED_INTERVALS,
                    });
                }
                intervals.push(MonitoredInterval {
                    name: name.clone(),
                    schedule: schedule.clone(),
                });
            }
            Ok(true)
        })?;

        info!(interval = %name, schedule = %schedule, "Interval registered");
        Ok(())
    }

    fn cancel(&self, name: &IntervalName) -> HostResult<()> {
        self.update(|intervals| {
            let before = intervals.len();
            intervals.retain(|i| &i.name != name);
            Ok(intervals.len() != before)
        })?;

        debug!(interval = %name, "Interval cancelled");
        Ok(())
    }
}
