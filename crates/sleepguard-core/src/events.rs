//! Events emitted by the session controller

use chrono::{DateTime, Local};
use sleepguard_api::{SessionEndReason, StrictnessPolicy};
use sleepguard_util::{IntervalName, SessionId};

/// Events emitted by the controller and settings for presentation to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// A manual session started and blocking is active
    SessionStarted {
        session_id: SessionId,
        strictness: StrictnessPolicy,
        ends_at: DateTime<Local>,
    },

    /// A session found in the store was taken over by this process
    SessionAdopted {
        session_id: SessionId,
        ends_at: DateTime<Local>,
    },

    /// Session ended and blocking was lifted
    SessionEnded {
        session_id: SessionId,
        reason: SessionEndReason,
    },

    /// Cancellation countdown started
    CancelStarted {
        session_id: SessionId,
        remaining: u32,
    },

    /// One second of the cancellation countdown elapsed
    CancelTick {
        session_id: SessionId,
        remaining: u32,
    },

    /// Cancellation countdown aborted; the session continues
    CancelAborted {
        session_id: SessionId,
        remaining: u32,
    },

    /// An interval could not be registered; background enforcement for it
    /// will not happen
    MonitoringDegraded { interval: IntervalName, error: String },

    /// Break-glass reset completed
    EmergencyReset { session_id: Option<SessionId> },
}
