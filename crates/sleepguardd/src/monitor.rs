//! The daemon loop body: boundary polling, restart catch-up, checkpoints

use chrono::{DateTime, Local};
use sleepguard_api::MonitoredInterval;
use sleepguard_core::IntervalReactor;
use sleepguard_host_api::{EnforcementGate, IntervalMonitor};
use sleepguard_host_linux::{
    IntervalScheduler, active_intervals, finished_intervals, net_boundaries,
};
use sleepguard_store::SessionStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies and lifts blocking at the boundaries of registered intervals.
///
/// The store's monitor checkpoint records the last time every boundary was
/// handled. A restarted monitor resumes from it, so a boundary it already
/// acted on is never applied twice, and one that passed while it was down
/// is applied once.
pub struct BackgroundMonitor {
    store: SessionStore,
    gate: Arc<dyn EnforcementGate>,
    intervals: Arc<dyn IntervalMonitor>,
    reactor: IntervalReactor,
    scheduler: IntervalScheduler,
}

impl BackgroundMonitor {
    pub fn new(
        store: SessionStore,
        gate: Arc<dyn EnforcementGate>,
        intervals: Arc<dyn IntervalMonitor>,
        now: DateTime<Local>,
    ) -> Self {
        let since = match store.load_monitor_checkpoint() {
            Some(checkpoint) if checkpoint <= now => checkpoint,
            Some(checkpoint) => {
                warn!(checkpoint = %checkpoint, now = %now, "Checkpoint is in the future, ignoring");
                now
            }
            None => now,
        };
        debug!(since = %since, "Monitor resuming");

        let reactor = IntervalReactor::new(store.clone(), gate.clone());
        Self {
            store,
            gate,
            intervals,
            reactor,
            scheduler: IntervalScheduler::new(since),
        }
    }

    /// Bring enforcement in line with the registrations after downtime.
    ///
    /// Boundaries missed since the checkpoint are not replayed one by one;
    /// only the last edge of each interval is applied.
    pub fn catch_up(&mut self, now: DateTime<Local>) {
        let registered = self.store.load_intervals();

        for boundary in net_boundaries(self.scheduler.poll(&registered, now)) {
            info!(
                interval = %boundary.name,
                kind = ?boundary.kind,
                at = %boundary.at,
                "Applying boundary missed while monitor was down"
            );
            self.reactor.dispatch(&boundary);
        }

        self.unregister_finished(&registered, now);
        self.reconcile_gate(&registered, now);
        self.checkpoint(now);
    }

    /// One poll: dispatch boundaries crossed since the last one
    pub fn tick(&mut self, now: DateTime<Local>) {
        let registered = self.store.load_intervals();
        let due = self.scheduler.poll(&registered, now);

        for boundary in &due {
            debug!(
                interval = %boundary.name,
                kind = ?boundary.kind,
                at = %boundary.at,
                "Dispatching boundary"
            );
            self.reactor.dispatch(boundary);
        }
        if !due.is_empty() {
            self.checkpoint(now);
        }

        self.unregister_finished(&registered, now);
    }

    /// Persist that every boundary up to `now` has been handled
    pub fn checkpoint(&self, now: DateTime<Local>) {
        if let Err(e) = self.store.save_monitor_checkpoint(now) {
            warn!(error = %e, "Failed to save monitor checkpoint");
        }
    }

    /// Rules follow the stored session: restored when a live session lost
    /// them, cleared when nothing is live or scheduled.
    fn reconcile_gate(&self, registered: &[MonitoredInterval], now: DateTime<Local>) {
        match self.store.load_session().filter(|s| s.is_live(now)) {
            Some(session) if !self.gate.is_active() => {
                info!(session_id = %session.id, "Restoring blocking for live session");
                if let Err(e) = self.gate.activate(&self.store.load_allow_list()) {
                    warn!(error = %e, "Failed to restore blocking");
                }
            }
            None if self.gate.is_active() && active_intervals(registered, now).is_empty() => {
                warn!("Stale shield rules with nothing scheduled, clearing");
                if let Err(e) = self.gate.deactivate() {
                    warn!(error = %e, "Failed to clear stale shield rules");
                }
            }
            _ => {}
        }
    }

    fn unregister_finished(&self, registered: &[MonitoredInterval], now: DateTime<Local>) {
        for name in finished_intervals(registered, now) {
            if let Err(e) = self.intervals.cancel(&name) {
                warn!(interval = %name, error = %e, "Failed to remove finished interval");
            }
        }
    }
}
