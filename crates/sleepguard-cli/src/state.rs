//! Text rendering of session state

use chrono::{DateTime, Local};
use sleepguard_api::{ControllerSnapshot, RecurringSchedule, ScheduleMode, Session};
use sleepguard_core::ControllerEvent;
use sleepguard_util::{format_clock_time, format_duration};

/// What the session screen shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenState {
    /// No session running
    Idle,
    /// Session running, optionally with a countdown in progress
    Active {
        label: String,
        strictness: String,
        ends_at: String,
        remaining: String,
        cancel_allowed: bool,
        countdown: Option<u32>,
    },
}

impl ScreenState {
    pub fn from_snapshot(snapshot: &ControllerSnapshot, now: DateTime<Local>) -> Self {
        let Some(session) = snapshot.active_session.as_ref().filter(|_| snapshot.has_active_session)
        else {
            return ScreenState::Idle;
        };

        ScreenState::Active {
            label: session_label(session),
            strictness: session.strictness.display_name().to_string(),
            ends_at: format_clock_time(&session.ends_at),
            remaining: format_duration(session.remaining(now)),
            cancel_allowed: session.strictness.allows_cancel(),
            countdown: snapshot.is_cancelling.then_some(snapshot.cancel_countdown),
        }
    }

    pub fn render(&self) -> String {
        match self {
            ScreenState::Idle => "No active session".to_string(),
            ScreenState::Active {
                label,
                strictness,
                ends_at,
                remaining,
                cancel_allowed,
                countdown,
            } => {
                let mut out = format!(
                    "Blocking active ({}, {})\n  Ends at {} ({} left)",
                    label, strictness, ends_at, remaining
                );
                match countdown {
                    Some(secs) => out.push_str(&format!(
                        "\n  Cancelling in {}s. [a] abort  [r] reset  [q] quit",
                        secs
                    )),
                    None if *cancel_allowed => {
                        out.push_str("\n  [c] cancel  [r] reset  [q] quit")
                    }
                    None => out.push_str("\n  Strict session: cannot cancel.  [r] reset  [q] quit"),
                }
                out
            }
        }
    }
}

fn session_label(session: &Session) -> String {
    match session.mode {
        ScheduleMode::Manual { .. } => format!("{} session", session.duration_label()),
        ScheduleMode::Recurring {
            start_hour,
            start_minute,
            end_hour,
            end_minute,
        } => format!(
            "nightly {:02}:{:02}-{:02}:{:02}",
            start_hour, start_minute, end_hour, end_minute
        ),
    }
}

/// One-line description of a controller event
pub fn describe_event(event: &ControllerEvent) -> String {
    match event {
        ControllerEvent::SessionStarted {
            strictness,
            ends_at,
            ..
        } => format!(
            "Session started ({}), blocking until {}",
            strictness.display_name(),
            format_clock_time(ends_at)
        ),
        ControllerEvent::SessionAdopted { ends_at, .. } => {
            format!("Session in progress until {}", format_clock_time(ends_at))
        }
        ControllerEvent::SessionEnded { reason, .. } => {
            format!("Session ended ({:?}), blocking lifted", reason)
        }
        ControllerEvent::CancelStarted { remaining, .. } => {
            format!("Cancelling in {}s", remaining)
        }
        ControllerEvent::CancelTick { remaining, .. } => format!("Cancelling in {}s", remaining),
        ControllerEvent::CancelAborted { .. } => "Cancel aborted, session continues".to_string(),
        ControllerEvent::MonitoringDegraded { interval, error } => format!(
            "Warning: background monitoring for '{}' unavailable ({}); keep sleepguard open to end the session on time",
            interval, error
        ),
        ControllerEvent::EmergencyReset { .. } => "Emergency reset: all blocking removed".to_string(),
    }
}

/// Multi-line description of the recurring schedule
pub fn describe_schedule(schedule: &RecurringSchedule) -> String {
    let window = match schedule.window() {
        Some(w) => format!("{} - {}", w.start, w.end),
        None => "invalid".to_string(),
    };
    format!(
        "Nightly schedule: {}\n  Window: {}\n  Strictness: {}",
        if schedule.enabled { "enabled" } else { "disabled" },
        window,
        schedule.strictness.display_name()
    )
}
