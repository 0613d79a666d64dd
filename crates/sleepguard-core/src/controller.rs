//! Session lifecycle controller

use chrono::{DateTime, Local};
use sleepguard_api::{
    CANCEL_COUNTDOWN_SECS, ControllerSnapshot, IntervalSchedule, MAX_SESSION_MINUTES,
    MIN_SESSION_MINUTES, Session, SessionEndReason, StrictnessPolicy,
};
use sleepguard_host_api::{EnforcementGate, IntervalMonitor};
use sleepguard_store::{AuditEventType, SessionStore};
use sleepguard_util::{IntervalName, Result, SleepguardError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    ActiveSession, COUNTDOWN_TICK, CancelCountdown, ControllerEvent, CountdownTick,
    CountdownTicker, SessionPhase,
};

/// Owns the foreground session state machine.
///
/// NoSession -> Active -> (Cancelling ->) NoSession. The controller lives on
/// the foreground event loop; countdown ticks arrive as messages on the
/// channel whose sender is handed in at construction.
pub struct SessionController {
    store: SessionStore,
    gate: Arc<dyn EnforcementGate>,
    monitor: Arc<dyn IntervalMonitor>,
    tick_tx: mpsc::UnboundedSender<CountdownTick>,
    current: Option<ActiveSession>,
    ticker: Option<CountdownTicker>,
    next_generation: u64,
}

impl SessionController {
    pub fn new(
        store: SessionStore,
        gate: Arc<dyn EnforcementGate>,
        monitor: Arc<dyn IntervalMonitor>,
        tick_tx: mpsc::UnboundedSender<CountdownTick>,
    ) -> Self {
        Self {
            store,
            gate,
            monitor,
            tick_tx,
            current: None,
            ticker: None,
            next_generation: 0,
        }
    }

    /// Start a manual session of `duration_minutes`.
    ///
    /// The returned events may include the end of a session that had already
    /// expired, followed by `SessionStarted` and possibly
    /// `MonitoringDegraded`.
    pub fn start_manual(
        &mut self,
        duration_minutes: u32,
        strictness: StrictnessPolicy,
        now: DateTime<Local>,
    ) -> Result<Vec<ControllerEvent>> {
        if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&duration_minutes) {
            return Err(SleepguardError::InvalidDuration(duration_minutes));
        }

        let mut events: Vec<ControllerEvent> = self.check_expiry(now).into_iter().collect();

        if self.current.is_some() {
            return Err(SleepguardError::SessionAlreadyActive);
        }
        if let Some(stored) = self.store.load_session().filter(|s| s.is_live(now)) {
            debug!(session_id = %stored.id, "Live session already in store");
            return Err(SleepguardError::SessionAlreadyActive);
        }

        let session = Session::manual(duration_minutes, strictness, now);
        self.store
            .save_session(&session)
            .map_err(|e| SleepguardError::store(e.to_string()))?;

        let allow_list = self.store.load_allow_list();
        if let Err(e) = self.gate.activate(&allow_list) {
            warn!(session_id = %session.id, error = %e, "Failed to activate blocking");
        }

        info!(
            session_id = %session.id,
            strictness = %strictness,
            duration_minutes,
            ends_at = %session.ends_at,
            "Session started"
        );
        self.store.audit(AuditEventType::SessionStarted {
            session_id: session.id.clone(),
            strictness,
            ends_at: session.ends_at,
        });
        events.push(ControllerEvent::SessionStarted {
            session_id: session.id.clone(),
            strictness,
            ends_at: session.ends_at,
        });

        let schedule = IntervalSchedule::once(session.started_at, session.ends_at);
        events.extend(register_interval(
            &self.store,
            self.monitor.as_ref(),
            IntervalName::manual_session(),
            schedule,
        ));

        self.current = Some(ActiveSession::new(session));
        Ok(events)
    }

    /// End the session if its end time has passed. Idempotent.
    pub fn check_expiry(&mut self, now: DateTime<Local>) -> Option<ControllerEvent> {
        let expired = self
            .current
            .as_ref()
            .map(|active| active.is_expired(now))
            .unwrap_or(false);

        if expired {
            self.end_session(SessionEndReason::Expired)
        } else {
            None
        }
    }

    /// Begin the Flexible cancellation countdown.
    ///
    /// Returns `None` without changing anything when there is no session,
    /// the session is Strict, or a countdown is already running. Must be
    /// called from within a tokio runtime.
    pub fn begin_cancel(&mut self) -> Option<ControllerEvent> {
        let active = self.current.as_mut()?;

        if !active.session.strictness.allows_cancel() {
            debug!(session_id = %active.session.id, "Cancel ignored for strict session");
            return None;
        }
        if active.cancel.is_some() {
            debug!(session_id = %active.session.id, "Cancel already in progress");
            return None;
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        let countdown = CancelCountdown::new(generation);
        active.cancel = Some(countdown);
        let session_id = active.session.id.clone();

        self.ticker = Some(CountdownTicker::start(
            generation,
            COUNTDOWN_TICK,
            self.tick_tx.clone(),
        ));

        info!(session_id = %session_id, generation, "Cancel countdown started");
        self.store.audit(AuditEventType::CancelStarted {
            session_id: session_id.clone(),
        });

        Some(ControllerEvent::CancelStarted {
            session_id,
            remaining: countdown.remaining,
        })
    }

    /// Apply one elapsed second of the countdown
    pub fn on_countdown_tick(&mut self, tick: CountdownTick) -> Vec<ControllerEvent> {
        let Some(active) = self.current.as_mut() else {
            debug!(generation = tick.generation, "Tick with no session, ignoring");
            return Vec::new();
        };
        let Some(countdown) = active.cancel.as_mut() else {
            debug!(generation = tick.generation, "Tick with no countdown, ignoring");
            return Vec::new();
        };
        if countdown.generation != tick.generation {
            debug!(
                generation = tick.generation,
                current = countdown.generation,
                "Stale countdown tick, ignoring"
            );
            return Vec::new();
        }

        let finished = countdown.tick();
        let mut events = vec![ControllerEvent::CancelTick {
            session_id: active.session.id.clone(),
            remaining: countdown.remaining,
        }];

        if finished {
            events.extend(self.end_session(SessionEndReason::Cancelled));
        }
        events
    }

    /// Abort a running countdown; the session continues unchanged
    pub fn abort_cancel(&mut self) -> Option<ControllerEvent> {
        let active = self.current.as_mut()?;
        let countdown = active.cancel.take()?;
        let session_id = active.session.id.clone();

        self.stop_ticker();

        info!(
            session_id = %session_id,
            remaining = countdown.remaining,
            "Cancel countdown aborted"
        );
        self.store.audit(AuditEventType::CancelAborted {
            session_id: session_id.clone(),
            remaining_secs: countdown.remaining,
        });

        Some(ControllerEvent::CancelAborted {
            session_id,
            remaining: countdown.remaining,
        })
    }

    /// Break-glass: tear everything down from any state. Never fails.
    pub fn emergency_reset(&mut self) -> ControllerEvent {
        self.stop_ticker();

        let session_id = self
            .current
            .take()
            .map(|active| active.session.id)
            .or_else(|| self.store.load_session().map(|s| s.id));

        self.teardown();

        warn!(session_id = ?session_id, "Emergency reset");
        self.store.audit(AuditEventType::EmergencyReset {
            had_session: session_id.is_some(),
        });

        ControllerEvent::EmergencyReset { session_id }
    }

    /// Bring in-memory state in line with the shared store.
    ///
    /// Run at startup and whenever the foreground regains attention: the
    /// background reactor may have started or ended a session meanwhile.
    pub fn reconcile(&mut self, now: DateTime<Local>) -> Vec<ControllerEvent> {
        match self.store.load_session() {
            None => {
                let Some(active) = self.current.take() else {
                    return Vec::new();
                };
                self.stop_ticker();
                info!(session_id = %active.session.id, "Session ended outside this process");
                vec![ControllerEvent::SessionEnded {
                    session_id: active.session.id,
                    reason: SessionEndReason::IntervalEnded,
                }]
            }
            Some(stored) if !stored.is_live(now) => {
                self.stop_ticker();
                self.current = None;
                self.teardown();

                info!(session_id = %stored.id, "Stored session already over, cleared");
                self.store.audit(AuditEventType::SessionEnded {
                    session_id: stored.id.clone(),
                    reason: SessionEndReason::Expired,
                });
                vec![ControllerEvent::SessionEnded {
                    session_id: stored.id,
                    reason: SessionEndReason::Expired,
                }]
            }
            Some(stored) => {
                let same = self
                    .current
                    .as_ref()
                    .map(|active| active.session.id == stored.id)
                    .unwrap_or(false);
                if same {
                    return Vec::new();
                }

                self.stop_ticker();

                // Prior gate state is not trusted; reapply from the allow-list
                let allow_list = self.store.load_allow_list();
                if let Err(e) = self.gate.activate(&allow_list) {
                    warn!(session_id = %stored.id, error = %e, "Failed to re-activate blocking");
                }

                info!(
                    session_id = %stored.id,
                    ends_at = %stored.ends_at,
                    "Adopted session from store"
                );
                let event = ControllerEvent::SessionAdopted {
                    session_id: stored.id.clone(),
                    ends_at: stored.ends_at,
                };
                self.current = Some(ActiveSession::new(stored));
                vec![event]
            }
        }
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.current.as_ref().map(|active| &active.session)
    }

    pub fn has_active_session(&self, now: DateTime<Local>) -> bool {
        self.current
            .as_ref()
            .map(|active| active.session.is_live(now))
            .unwrap_or(false)
    }

    pub fn is_cancelling(&self) -> bool {
        self.phase() == SessionPhase::Cancelling
    }

    /// Seconds left on the countdown; the full countdown when not cancelling
    pub fn cancel_countdown(&self) -> u32 {
        self.current
            .as_ref()
            .and_then(|active| active.cancel)
            .map(|countdown| countdown.remaining)
            .unwrap_or(CANCEL_COUNTDOWN_SECS)
    }

    pub fn phase(&self) -> SessionPhase {
        self.current
            .as_ref()
            .map(ActiveSession::phase)
            .unwrap_or(SessionPhase::NoSession)
    }

    pub fn snapshot(&self, now: DateTime<Local>) -> ControllerSnapshot {
        ControllerSnapshot {
            active_session: self.active_session().cloned(),
            has_active_session: self.has_active_session(now),
            is_cancelling: self.is_cancelling(),
            cancel_countdown: self.cancel_countdown(),
        }
    }

    /// Session state as recorded in the store, for read-only observers.
    ///
    /// Unlike `reconcile`, this touches neither the gate nor the store, and
    /// a countdown running in another process is not visible.
    pub fn stored_snapshot(store: &SessionStore, now: DateTime<Local>) -> ControllerSnapshot {
        let session = store.load_session();
        ControllerSnapshot {
            has_active_session: session.as_ref().is_some_and(|s| s.is_live(now)),
            active_session: session,
            is_cancelling: false,
            cancel_countdown: CANCEL_COUNTDOWN_SECS,
        }
    }

    fn end_session(&mut self, reason: SessionEndReason) -> Option<ControllerEvent> {
        let active = self.current.take()?;
        self.stop_ticker();
        self.teardown();

        info!(session_id = %active.session.id, reason = ?reason, "Session ended");
        self.store.audit(AuditEventType::SessionEnded {
            session_id: active.session.id.clone(),
            reason,
        });

        Some(ControllerEvent::SessionEnded {
            session_id: active.session.id,
            reason,
        })
    }

    /// Lift blocking and forget the session everywhere. Best-effort.
    fn teardown(&self) {
        if let Err(e) = self.gate.deactivate() {
            warn!(error = %e, "Failed to deactivate blocking");
        }
        if let Err(e) = self.monitor.cancel(&IntervalName::manual_session()) {
            warn!(error = %e, "Failed to cancel session interval");
        }
        if let Err(e) = self.store.clear_session() {
            warn!(error = %e, "Failed to clear stored session");
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

/// Register `name` with the monitor. A failure is logged and audited and
/// comes back as `MonitoringDegraded`; it never aborts the caller.
pub(crate) fn register_interval(
    store: &SessionStore,
    monitor: &dyn IntervalMonitor,
    name: IntervalName,
    schedule: IntervalSchedule,
) -> Option<ControllerEvent> {
    match monitor.schedule(&name, schedule) {
        Ok(()) => {
            debug!(interval = %name, "Interval registered");
            None
        }
        Err(e) => {
            warn!(
                interval = %name,
                error = %e,
                "Failed to register interval, background enforcement degraded"
            );
            store.audit(AuditEventType::MonitoringFailed {
                name: name.clone(),
                error: e.to_string(),
            });
            Some(ControllerEvent::MonitoringDegraded {
                interval: name,
                error: e.to_string(),
            })
        }
    }
}
