//! Background interval reactor
//!
//! Runs in the daemon, never alongside the foreground controller's memory.
//! Everything it needs is read from the shared store at each boundary.

use chrono::{DateTime, Local};
use sleepguard_api::{BoundaryKind, IntervalBoundary, Session};
use sleepguard_host_api::EnforcementGate;
use sleepguard_store::{AuditEventType, SessionStore};
use sleepguard_util::IntervalName;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reacts to interval boundaries delivered by the scheduler
pub struct IntervalReactor {
    store: SessionStore,
    gate: Arc<dyn EnforcementGate>,
}

impl IntervalReactor {
    pub fn new(store: SessionStore, gate: Arc<dyn EnforcementGate>) -> Self {
        Self { store, gate }
    }

    /// Route a boundary reported by the scheduler
    pub fn dispatch(&self, boundary: &IntervalBoundary) {
        match boundary.kind {
            BoundaryKind::Start => self.interval_did_start(&boundary.name, boundary.at),
            BoundaryKind::End => self.interval_did_end(&boundary.name, boundary.at),
        }
    }

    /// An interval began: apply blocking with the current allow-list.
    ///
    /// When the nightly schedule starts and nothing else is running, the
    /// occurrence is recorded as a Recurring session so the foreground can
    /// show it.
    pub fn interval_did_start(&self, name: &IntervalName, at: DateTime<Local>) {
        info!(interval = %name, at = %at, "Interval started");

        let allow_list = self.store.load_allow_list();
        if let Err(e) = self.gate.activate(&allow_list) {
            warn!(interval = %name, error = %e, "Failed to activate blocking");
        }

        if name.as_str() == IntervalName::NIGHTLY_SCHEDULE {
            self.record_nightly_session(at);
        }

        self.store
            .audit(AuditEventType::IntervalStarted { name: name.clone() });
    }

    /// An interval ended: lift blocking and forget the session
    pub fn interval_did_end(&self, name: &IntervalName, at: DateTime<Local>) {
        info!(interval = %name, at = %at, "Interval ended");

        if let Err(e) = self.gate.deactivate() {
            warn!(interval = %name, error = %e, "Failed to deactivate blocking");
        }
        if let Err(e) = self.store.clear_session() {
            warn!(interval = %name, error = %e, "Failed to clear stored session");
        }

        self.store
            .audit(AuditEventType::IntervalEnded { name: name.clone() });
    }

    fn record_nightly_session(&self, at: DateTime<Local>) {
        if let Some(existing) = self.store.load_session().filter(|s| s.is_live(at)) {
            debug!(session_id = %existing.id, "Session already live, not recording nightly session");
            return;
        }

        let schedule = self.store.load_schedule_or_default();
        let session = Session::recurring(&schedule, at);
        match self.store.save_session(&session) {
            Ok(()) => info!(
                session_id = %session.id,
                strictness = %session.strictness,
                ends_at = %session.ends_at,
                "Nightly session recorded"
            ),
            Err(e) => warn!(error = %e, "Failed to record nightly session"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sleepguard_api::{AllowKind, AllowList, RecurringSchedule, StrictnessPolicy};
    use sleepguard_host_api::{GateCall, MockGate};
    use sleepguard_store::SqliteStore;

    fn setup() -> (IntervalReactor, SessionStore, Arc<MockGate>) {
        let store = SessionStore::new(Arc::new(SqliteStore::in_memory().unwrap()));
        let gate = Arc::new(MockGate::new());
        let reactor = IntervalReactor::new(store.clone(), gate.clone());
        (reactor, store, gate)
    }

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 12, 25, h, m, 0).unwrap()
    }

    #[test]
    fn start_activates_with_allow_list() {
        let (reactor, store, gate) = setup();
        let mut allow = AllowList::default();
        allow.insert(AllowKind::Category, "health");
        store.save_allow_list(&allow).unwrap();

        reactor.interval_did_start(&IntervalName::manual_session(), at(21, 0));

        assert_eq!(gate.calls(), vec![GateCall::Activate(allow)]);
        // Manual sessions are written by the foreground, not here
        assert!(store.load_session().is_none());
    }

    #[test]
    fn end_deactivates_and_clears_session() {
        let (reactor, store, gate) = setup();
        store
            .save_session(&Session::manual(60, StrictnessPolicy::Strict, at(21, 0)))
            .unwrap();
        reactor.interval_did_start(&IntervalName::manual_session(), at(21, 0));

        reactor.interval_did_end(&IntervalName::manual_session(), at(22, 0));

        assert!(!gate.is_active());
        assert!(store.load_session().is_none());

        let audits = store.raw().get_recent_audits(10).unwrap();
        assert!(matches!(audits[0].event, AuditEventType::IntervalEnded { .. }));
        assert!(matches!(audits[1].event, AuditEventType::IntervalStarted { .. }));
    }

    #[test]
    fn nightly_start_records_recurring_session() {
        let (reactor, store, _gate) = setup();
        let schedule = RecurringSchedule {
            enabled: true,
            strictness: StrictnessPolicy::Strict,
            ..Default::default()
        };
        store.save_schedule(&schedule).unwrap();

        reactor.interval_did_start(&IntervalName::nightly_schedule(), at(22, 0));

        let session = store.load_session().unwrap();
        assert_eq!(session.strictness, StrictnessPolicy::Strict);
        assert_eq!(session.started_at, at(22, 0));
        assert_eq!(
            session.ends_at,
            Local.with_ymd_and_hms(2025, 12, 26, 7, 0, 0).unwrap()
        );
    }

    #[test]
    fn nightly_start_keeps_live_manual_session() {
        let (reactor, store, gate) = setup();
        let manual = Session::manual(120, StrictnessPolicy::Flexible, at(21, 30));
        store.save_session(&manual).unwrap();

        reactor.interval_did_start(&IntervalName::nightly_schedule(), at(22, 0));

        assert_eq!(store.load_session(), Some(manual));
        assert!(gate.is_active());
    }

    #[test]
    fn dispatch_routes_by_kind() {
        let (reactor, store, gate) = setup();
        let name = IntervalName::nightly_schedule();

        reactor.dispatch(&IntervalBoundary {
            name: name.clone(),
            kind: BoundaryKind::Start,
            at: at(22, 0),
        });
        assert!(gate.is_active());
        assert!(store.load_session().is_some());

        reactor.dispatch(&IntervalBoundary {
            name,
            kind: BoundaryKind::End,
            at: at(23, 0),
        });
        assert!(!gate.is_active());
        assert!(store.load_session().is_none());
    }

    #[test]
    fn boundaries_are_idempotent() {
        let (reactor, store, gate) = setup();
        reactor.interval_did_start(&IntervalName::nightly_schedule(), at(22, 0));
        let first = store.load_session();
        reactor.interval_did_start(&IntervalName::nightly_schedule(), at(22, 0));
        assert_eq!(store.load_session(), first);

        reactor.interval_did_end(&IntervalName::nightly_schedule(), at(22, 30));
        reactor.interval_did_end(&IntervalName::nightly_schedule(), at(22, 30));
        assert!(!gate.is_active());
        assert!(store.load_session().is_none());
    }
}
