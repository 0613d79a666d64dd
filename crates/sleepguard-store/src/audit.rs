//! Audit event types

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sleepguard_api::{SessionEndReason, StrictnessPolicy};
use sleepguard_util::{IntervalName, SessionId};

/// Types of audit events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Background monitor started
    MonitorStarted,

    /// Background monitor stopped
    MonitorStopped,

    /// Session started
    SessionStarted {
        session_id: SessionId,
        strictness: StrictnessPolicy,
        ends_at: DateTime<Local>,
    },

    /// Session ended
    SessionEnded {
        session_id: SessionId,
        reason: SessionEndReason,
    },

    /// Flexible cancellation countdown started
    CancelStarted { session_id: SessionId },

    /// Cancellation countdown aborted by the user
    CancelAborted {
        session_id: SessionId,
        remaining_secs: u32,
    },

    /// Break-glass reset
    EmergencyReset { had_session: bool },

    /// Interval start observed by the background monitor
    IntervalStarted { name: IntervalName },

    /// Interval end observed by the background monitor
    IntervalEnded { name: IntervalName },

    /// Registering an interval with the scheduler failed
    MonitoringFailed { name: IntervalName, error: String },

    /// Recurring schedule saved
    ScheduleSaved { enabled: bool },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: sleepguard_util::now(),
            event,
        }
    }
}
