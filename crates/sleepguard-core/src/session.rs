//! In-memory session state
//!
//! The in-memory session is only a cache of the `activeSession` record; it is
//! rebuilt from the store whenever the process starts.

use chrono::{DateTime, Local};
use sleepguard_api::{CANCEL_COUNTDOWN_SECS, Session};

/// Coarse controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NoSession,
    Active,
    Cancelling,
}

/// Progress of a running cancellation countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelCountdown {
    /// Identifies the ticker driving this countdown
    pub generation: u64,

    /// Seconds left before the session is cancelled
    pub remaining: u32,
}

impl CancelCountdown {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            remaining: CANCEL_COUNTDOWN_SECS,
        }
    }

    /// Consume one second; returns true when the countdown reached zero
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

/// The session this process currently tracks
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub session: Session,
    pub cancel: Option<CancelCountdown>,
}

impl ActiveSession {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            cancel: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.cancel.is_some() {
            SessionPhase::Cancelling
        } else {
            SessionPhase::Active
        }
    }

    pub fn is_expired(&self, now: DateTime<Local>) -> bool {
        self.session.is_expired(now)
    }
}
