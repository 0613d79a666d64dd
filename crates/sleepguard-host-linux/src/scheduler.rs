//! Interval boundary computation
//!
//! The daemon polls; each poll asks which start/end edges of the registered
//! intervals fell in the half-open range `(last_check, now]`.

use chrono::{DateTime, Local};
use sleepguard_api::{BoundaryKind, IntervalBoundary, IntervalSchedule, MonitoredInterval};
use sleepguard_util::IntervalName;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Tracks the last poll time and yields boundaries crossed since then
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    last_check: DateTime<Local>,
}

impl IntervalScheduler {
    pub fn new(start: DateTime<Local>) -> Self {
        Self { last_check: start }
    }

    pub fn last_check(&self) -> DateTime<Local> {
        self.last_check
    }

    /// Boundaries crossed since the previous poll, oldest first
    pub fn poll(
        &mut self,
        intervals: &[MonitoredInterval],
        now: DateTime<Local>,
    ) -> Vec<IntervalBoundary> {
        if now < self.last_check {
            warn!(
                last_check = %self.last_check,
                now = %now,
                "Clock moved backwards, skipping boundary check"
            );
            self.last_check = now;
            return Vec::new();
        }

        let due = due_boundaries(intervals, self.last_check, now);
        self.last_check = now;
        due
    }
}

/// Boundaries with `after < at <= until`, sorted by time.
///
/// At the same instant an end sorts before a start, so back-to-back intervals
/// leave blocking on.
pub fn due_boundaries(
    intervals: &[MonitoredInterval],
    after: DateTime<Local>,
    until: DateTime<Local>,
) -> Vec<IntervalBoundary> {
    let mut due = Vec::new();
    if until <= after {
        return due;
    }

    let in_range = |at: &DateTime<Local>| after < *at && *at <= until;

    for interval in intervals {
        match &interval.schedule {
            IntervalSchedule::Once { start, end } => {
                if in_range(start) {
                    due.push(boundary(&interval.name, BoundaryKind::Start, *start));
                }
                if in_range(end) {
                    due.push(boundary(&interval.name, BoundaryKind::End, *end));
                }
            }
            IntervalSchedule::Daily { start, end } => {
                let mut date = after.date_naive();
                let last = until.date_naive();
                while date <= last {
                    for (kind, clock) in [(BoundaryKind::Start, start), (BoundaryKind::End, end)] {
                        if let Some(at) = clock.on_date(date).filter(&in_range) {
                            due.push(boundary(&interval.name, kind, at));
                        }
                    }
                    let Some(next) = date.succ_opt() else { break };
                    date = next;
                }
            }
        }
    }

    due.sort_by(boundary_order);
    if !due.is_empty() {
        debug!(count = due.len(), after = %after, until = %until, "Boundaries due");
    }
    due
}

/// Registered intervals that are in progress at `now`
pub fn active_intervals(intervals: &[MonitoredInterval], now: DateTime<Local>) -> Vec<IntervalName> {
    intervals
        .iter()
        .filter(|i| i.schedule.contains(&now))
        .map(|i| i.name.clone())
        .collect()
}

/// The last boundary of each interval in `due`, oldest first.
///
/// After downtime only the resulting state matters: an interval whose start
/// and end both passed has ended, one whose start passed last is in progress.
pub fn net_boundaries(due: Vec<IntervalBoundary>) -> Vec<IntervalBoundary> {
    let mut last: BTreeMap<IntervalName, IntervalBoundary> = BTreeMap::new();
    for boundary in due {
        last.insert(boundary.name.clone(), boundary);
    }

    let mut net: Vec<_> = last.into_values().collect();
    net.sort_by(boundary_order);
    net
}

/// One-shot intervals whose end has passed and can be unregistered
pub fn finished_intervals(
    intervals: &[MonitoredInterval],
    now: DateTime<Local>,
) -> Vec<IntervalName> {
    intervals
        .iter()
        .filter(|i| matches!(i.schedule, IntervalSchedule::Once { end, .. } if end <= now))
        .map(|i| i.name.clone())
        .collect()
}

fn boundary(name: &IntervalName, kind: BoundaryKind, at: DateTime<Local>) -> IntervalBoundary {
    IntervalBoundary {
        name: name.clone(),
        kind,
        at,
    }
}

fn boundary_order(a: &IntervalBoundary, b: &IntervalBoundary) -> Ordering {
    a.at.cmp(&b.at)
        .then_with(|| kind_order(a.kind).cmp(&kind_order(b.kind)))
}

fn kind_order(kind: BoundaryKind) -> u8 {
    match kind {
        BoundaryKind::End => 0,
        BoundaryKind::Start => 1,
    }
}
