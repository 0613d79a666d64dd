//! Monitored interval schedules

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sleepguard_util::{DailyWindow, IntervalName, WallClock};
use std::fmt;

/// When a named interval starts and ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntervalSchedule {
    /// Fires once: start at `start`, end at `end`
    Once {
        start: DateTime<Local>,
        end: DateTime<Local>,
    },
    /// Repeats every day at wall-clock times; may wrap past midnight
    Daily { start: WallClock, end: WallClock },
}

impl IntervalSchedule {
    pub fn once(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self::Once { start, end }
    }

    pub fn daily(window: DailyWindow) -> Self {
        Self::Daily {
            start: window.start,
            end: window.end,
        }
    }

    pub fn repeats(&self) -> bool {
        matches!(self, IntervalSchedule::Daily { .. })
    }

    /// Whether `now` lies inside the interval
    pub fn contains(&self, now: &DateTime<Local>) -> bool {
        match self {
            IntervalSchedule::Once { start, end } => start <= now && now < end,
            IntervalSchedule::Daily { start, end } => DailyWindow::new(*start, *end).contains(now),
        }
    }
}

impl fmt::Display for IntervalSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalSchedule::Once { start, end } => write!(
                f,
                "once {} -> {}",
                start.format("%Y-%m-%d %H:%M:%S"),
                end.format("%Y-%m-%d %H:%M:%S")
            ),
            IntervalSchedule::Daily { start, end } => write!(f, "daily {} -> {}", start, end),
        }
    }
}

/// A named interval as registered with the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredInterval {
    pub name: IntervalName,
    pub schedule: IntervalSchedule,
}

/// Which edge of an interval was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    Start,
    End,
}

/// A start or end edge of a named interval at a concrete instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalBoundary {
    pub name: IntervalName,
    pub kind: BoundaryKind,
    pub at: DateTime<Local>,
}
