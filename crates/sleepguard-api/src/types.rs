//! Shared types for sleepguard

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sleepguard_util::{DailyWindow, SessionId, WallClock};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::CANCEL_COUNTDOWN_SECS;

/// Shortest manual session, in minutes
pub const MIN_SESSION_MINUTES: u32 = 1;

/// Longest manual session, in minutes (one day)
pub const MAX_SESSION_MINUTES: u32 = 1440;

/// Quick-pick durations offered for manual sessions: (label, minutes)
pub const DURATION_PRESETS: [(&str, u32); 6] = [
    ("30m", 30),
    ("1h", 60),
    ("2h", 120),
    ("4h", 240),
    ("6h", 360),
    ("8h", 480),
];

/// How a session may be cancelled before its end time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictnessPolicy {
    /// No cancellation path
    Strict,
    /// Cancellation after an abortable countdown
    #[default]
    Flexible,
}

impl StrictnessPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrictnessPolicy::Strict => "strict",
            StrictnessPolicy::Flexible => "flexible",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StrictnessPolicy::Strict => "Strict",
            StrictnessPolicy::Flexible => "Flexible",
        }
    }

    pub fn description(&self) -> String {
        match self {
            StrictnessPolicy::Strict => "Cannot cancel until time is up".to_string(),
            StrictnessPolicy::Flexible => {
                format!("Cancel with a {}-second delay", CANCEL_COUNTDOWN_SECS)
            }
        }
    }

    pub fn allows_cancel(&self) -> bool {
        matches!(self, StrictnessPolicy::Flexible)
    }
}

impl fmt::Display for StrictnessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrictnessPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(StrictnessPolicy::Strict),
            "flexible" => Ok(StrictnessPolicy::Flexible),
            other => Err(format!("unknown strictness '{}'", other)),
        }
    }
}

/// How a session was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScheduleMode {
    #[serde(rename_all = "camelCase")]
    Manual { duration_minutes: u32 },
    #[serde(rename_all = "camelCase")]
    Recurring {
        start_hour: u8,
        start_minute: u8,
        end_hour: u8,
        end_minute: u8,
    },
}

/// A time-bounded request to block distracting apps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub mode: ScheduleMode,
    pub strictness: StrictnessPolicy,
    pub started_at: DateTime<Local>,
    pub ends_at: DateTime<Local>,
    pub is_active: bool,
}

impl Session {
    /// Build a manual session running `duration_minutes` from `now`
    pub fn manual(duration_minutes: u32, strictness: StrictnessPolicy, now: DateTime<Local>) -> Self {
        Self {
            id: SessionId::new(),
            mode: ScheduleMode::Manual { duration_minutes },
            strictness,
            started_at: now,
            ends_at: now + chrono::Duration::minutes(duration_minutes as i64),
            is_active: true,
        }
    }

    /// Build a session for the occurrence of `schedule` that started at `started_at`
    pub fn recurring(schedule: &RecurringSchedule, started_at: DateTime<Local>) -> Self {
        let length = schedule
            .window()
            .map(|w| w.length())
            .unwrap_or(Duration::ZERO);
        let ends_at = started_at
            + chrono::Duration::from_std(length).unwrap_or_else(|_| chrono::Duration::zero());

        Self {
            id: SessionId::new(),
            mode: ScheduleMode::Recurring {
                start_hour: schedule.start_hour,
                start_minute: schedule.start_minute,
                end_hour: schedule.end_hour,
                end_minute: schedule.end_minute,
            },
            strictness: schedule.strictness,
            started_at,
            ends_at,
            is_active: true,
        }
    }

    /// True when the end time has been reached
    pub fn is_expired(&self, now: DateTime<Local>) -> bool {
        now >= self.ends_at
    }

    /// Active iff flagged active and not yet past the end time
    pub fn is_live(&self, now: DateTime<Local>) -> bool {
        self.is_active && !self.is_expired(now)
    }

    /// Time left until the end, zero once expired
    pub fn remaining(&self, now: DateTime<Local>) -> Duration {
        (self.ends_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn total_duration(&self) -> Duration {
        (self.ends_at - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Compact label such as `1h 30m`, `2h`, or `45m`
    pub fn duration_label(&self) -> String {
        let total = self.total_duration().as_secs();
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        if hours > 0 {
            if minutes > 0 {
                format!("{}h {}m", hours, minutes)
            } else {
                format!("{}h", hours)
            }
        } else {
            format!("{}m", minutes)
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    /// End time reached
    Expired,
    /// Flexible countdown ran to completion
    Cancelled,
    /// Break-glass reset
    EmergencyReset,
    /// Background monitor observed the interval end
    IntervalEnded,
}

/// Schedule validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("hour {0} out of range (0-23)")]
    HourOutOfRange(u8),

    #[error("minute {0} out of range (0-59)")]
    MinuteOutOfRange(u8),

    #[error("start and end are both {0}")]
    EmptyWindow(WallClock),
}

/// Recurring nightly blocking window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringSchedule {
    pub enabled: bool,
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
    pub strictness: StrictnessPolicy,
}

impl Default for RecurringSchedule {
    fn default() -> Self {
        Self {
            enabled: false,
            start_hour: 22,
            start_minute: 0,
            end_hour: 7,
            end_minute: 0,
            strictness: StrictnessPolicy::Flexible,
        }
    }
}

impl RecurringSchedule {
    pub fn start(&self) -> Option<WallClock> {
        WallClock::new(self.start_hour, self.start_minute)
    }

    pub fn end(&self) -> Option<WallClock> {
        WallClock::new(self.end_hour, self.end_minute)
    }

    pub fn set_start(&mut self, at: WallClock) {
        self.start_hour = at.hour;
        self.start_minute = at.minute;
    }

    pub fn set_end(&mut self, at: WallClock) {
        self.end_hour = at.hour;
        self.end_minute = at.minute;
    }

    /// The daily window, or `None` if any component is out of range
    pub fn window(&self) -> Option<DailyWindow> {
        Some(DailyWindow::new(self.start()?, self.end()?))
    }

    pub fn validate(&self) -> Result<DailyWindow, ScheduleError> {
        for hour in [self.start_hour, self.end_hour] {
            if hour > 23 {
                return Err(ScheduleError::HourOutOfRange(hour));
            }
        }
        for minute in [self.start_minute, self.end_minute] {
            if minute > 59 {
                return Err(ScheduleError::MinuteOutOfRange(minute));
            }
        }
        let window = self
            .window()
            .ok_or(ScheduleError::HourOutOfRange(self.start_hour))?;
        if window.start == window.end {
            return Err(ScheduleError::EmptyWindow(window.start));
        }
        Ok(window)
    }
}

/// Which part of the allow-list a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowKind {
    Application,
    Category,
    WebDomain,
}

impl FromStr for AllowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "app" | "application" => Ok(AllowKind::Application),
            "category" => Ok(AllowKind::Category),
            "domain" | "web-domain" | "web_domain" => Ok(AllowKind::WebDomain),
            other => Err(format!("unknown allow-list kind '{}'", other)),
        }
    }
}

/// User-selected applications, categories and web domains exempt from blocking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowList {
    #[serde(default)]
    pub applications: BTreeSet<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub web_domains: BTreeSet<String>,
}

impl AllowList {
    pub fn is_empty(&self) -> bool {
        self.applications.is_empty() && self.categories.is_empty() && self.web_domains.is_empty()
    }

    pub fn len(&self) -> usize {
        self.applications.len() + self.categories.len() + self.web_domains.len()
    }

    fn set_mut(&mut self, kind: AllowKind) -> &mut BTreeSet<String> {
        match kind {
            AllowKind::Application => &mut self.applications,
            AllowKind::Category => &mut self.categories,
            AllowKind::WebDomain => &mut self.web_domains,
        }
    }

    /// Returns true if the token was not already present
    pub fn insert(&mut self, kind: AllowKind, token: impl Into<String>) -> bool {
        self.set_mut(kind).insert(token.into())
    }

    /// Returns true if the token was present
    pub fn remove(&mut self, kind: AllowKind, token: &str) -> bool {
        self.set_mut(kind).remove(token)
    }

    pub fn clear(&mut self) {
        self.applications.clear();
        self.categories.clear();
        self.web_domains.clear();
    }
}

/// Session state as observed by presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub active_session: Option<Session>,
    pub has_active_session: bool,
    pub is_cancelling: bool,
    pub cancel_countdown: u32,
}
