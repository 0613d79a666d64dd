//! Integration tests for sleepguardd
//!
//! These drive the daemon's monitor against an on-disk store shared with a
//! foreground controller, each side with its own store handle and file gate.

use chrono::{DateTime, Local, TimeZone};
use sleepguard_api::{
    AllowKind, RecurringSchedule, ScheduleMode, SessionEndReason, StrictnessPolicy,
};
use sleepguard_core::{ControllerEvent, Preferences, ScheduleSettings, SessionController};
use sleepguard_host_api::EnforcementGate;
use sleepguard_host_linux::{FileShieldGate, StoreIntervalMonitor};
use sleepguard_store::{SessionStore, SqliteStore, Store};
use sleepguard_util::{IntervalName, WallClock};
use sleepguardd::BackgroundMonitor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

fn at(day: u32, h: u32, m: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 12, day, h, m, 0).unwrap()
}

/// One process's view of the shared state
struct Process {
    store: SessionStore,
    gate: Arc<FileShieldGate>,
    monitor: Arc<StoreIntervalMonitor>,
}

fn open_process(dir: &Path) -> Process {
    let raw: Arc<dyn Store> =
        Arc::new(SqliteStore::open(&sleepguard_util::store_path(dir)).unwrap());
    let store = SessionStore::new(raw);
    Process {
        gate: Arc::new(FileShieldGate::new(dir.join("run").join("shield.json"))),
        monitor: Arc::new(StoreIntervalMonitor::new(store.clone())),
        store,
    }
}

/// The daemon, minus timers and signals
struct Daemon {
    process: Process,
    monitor: BackgroundMonitor,
}

impl Daemon {
    fn start(dir: &Path, now: DateTime<Local>) -> Self {
        let process = open_process(dir);
        let mut monitor = BackgroundMonitor::new(
            process.store.clone(),
            process.gate.clone(),
            process.monitor.clone(),
            now,
        );
        monitor.catch_up(now);
        Self { process, monitor }
    }

    fn tick(&mut self, now: DateTime<Local>) {
        self.monitor.tick(now);
    }
}

fn nightly_strict() -> RecurringSchedule {
    let mut schedule = RecurringSchedule {
        enabled: true,
        strictness: StrictnessPolicy::Strict,
        ..Default::default()
    };
    schedule.set_start(WallClock::new(22, 0).unwrap());
    schedule.set_end(WallClock::new(7, 0).unwrap());
    schedule
}

#[test]
fn nightly_schedule_blocks_overnight() {
    let dir = TempDir::new().unwrap();

    // Foreground: allow the alarm app and save a strict 22:00-07:00 schedule
    let app = open_process(dir.path());
    Preferences::new(app.store.clone())
        .allow(AllowKind::Application, "com.example.alarm")
        .unwrap();
    let events = ScheduleSettings::new(app.store.clone(), app.monitor.clone())
        .save(&nightly_strict())
        .unwrap();
    assert!(events.is_empty());

    // Background monitor, separate store handle on the same file
    let mut daemon = Daemon::start(dir.path(), at(25, 21, 0));

    daemon.tick(at(25, 21, 59));
    assert!(!daemon.process.gate.is_active());

    daemon.tick(at(25, 22, 0));
    assert!(daemon.process.gate.is_active());
    let rules = daemon.process.gate.current().unwrap().rules;
    assert!(!rules.blocks(AllowKind::Application, "com.example.alarm"));
    assert!(rules.blocks(AllowKind::Application, "com.example.game"));

    let session = app.store.load_session().unwrap();
    assert_eq!(session.strictness, StrictnessPolicy::Strict);
    assert!(matches!(session.mode, ScheduleMode::Recurring { start_hour: 22, .. }));

    // Still blocked in the small hours
    daemon.tick(at(26, 3, 0));
    assert!(daemon.process.gate.is_active());

    daemon.tick(at(26, 7, 0));
    assert!(!daemon.process.gate.is_active());
    assert!(app.store.load_session().is_none());

    // The registration repeats
    assert_eq!(daemon.process.monitor.registrations().len(), 1);
    daemon.tick(at(26, 22, 0));
    assert!(daemon.process.gate.is_active());
}

#[test]
fn foreground_adopts_nightly_session_and_cannot_cancel() {
    let dir = TempDir::new().unwrap();
    let app = open_process(dir.path());
    ScheduleSettings::new(app.store.clone(), app.monitor.clone())
        .save(&nightly_strict())
        .unwrap();

    let mut daemon = Daemon::start(dir.path(), at(25, 21, 59));
    daemon.tick(at(25, 22, 0));

    let (tx, _rx) = mpsc::unbounded_channel();
    let mut controller =
        SessionController::new(app.store.clone(), app.gate.clone(), app.monitor.clone(), tx);

    let events = controller.reconcile(at(25, 23, 0));
    assert!(matches!(events[0], ControllerEvent::SessionAdopted { .. }));
    assert!(controller.has_active_session(at(25, 23, 0)));

    // Strict: no cancel path, and a manual session cannot be stacked on top
    assert!(controller.begin_cancel().is_none());
    assert!(
        controller
            .start_manual(30, StrictnessPolicy::Flexible, at(25, 23, 0))
            .is_err()
    );

    // The morning boundary ends it; the foreground notices on its next pass
    daemon.tick(at(26, 7, 0));
    let events = controller.reconcile(at(26, 7, 1));
    assert!(matches!(
        events[0],
        ControllerEvent::SessionEnded { reason: SessionEndReason::IntervalEnded, .. }
    ));
    assert!(!app.gate.is_active());
}

#[test]
fn manual_session_ends_in_background() {
    let dir = TempDir::new().unwrap();
    let app = open_process(dir.path());

    let (tx, _rx) = mpsc::unbounded_channel();
    let mut controller =
        SessionController::new(app.store.clone(), app.gate.clone(), app.monitor.clone(), tx);
    controller
        .start_manual(30, StrictnessPolicy::Strict, at(25, 20, 0))
        .unwrap();
    assert!(app.gate.is_active());

    // Foreground exits; the daemon picks up at 20:10
    drop(controller);
    let mut daemon = Daemon::start(dir.path(), at(25, 20, 10));

    daemon.tick(at(25, 20, 29));
    assert!(daemon.process.gate.is_active());

    daemon.tick(at(25, 20, 30));
    assert!(!daemon.process.gate.is_active());
    assert!(app.store.load_session().is_none());

    // One-shot registration is gone once finished
    assert!(daemon.process.monitor.registrations().is_empty());
}

#[test]
fn disabling_schedule_stops_background_enforcement() {
    let dir = TempDir::new().unwrap();
    let app = open_process(dir.path());
    let settings = ScheduleSettings::new(app.store.clone(), app.monitor.clone());
    settings.save(&nightly_strict()).unwrap();
    settings.set_enabled(false).unwrap();

    let mut daemon = Daemon::start(dir.path(), at(25, 21, 0));
    daemon.tick(at(25, 22, 30));

    assert!(!daemon.process.gate.is_active());
    assert!(app.store.load_session().is_none());
    assert!(
        daemon
            .process
            .monitor
            .registrations()
            .iter()
            .all(|i| i.name != IntervalName::nightly_schedule())
    );
}

#[test]
fn emergency_reset_survives_daemon_restart() {
    let dir = TempDir::new().unwrap();
    let app = open_process(dir.path());
    let mut schedule = nightly_strict();
    schedule.strictness = StrictnessPolicy::Flexible;
    ScheduleSettings::new(app.store.clone(), app.monitor.clone())
        .save(&schedule)
        .unwrap();

    let mut daemon = Daemon::start(dir.path(), at(25, 21, 0));
    daemon.tick(at(25, 22, 0));
    assert!(app.gate.is_active());

    let (tx, _rx) = mpsc::unbounded_channel();
    let mut controller =
        SessionController::new(app.store.clone(), app.gate.clone(), app.monitor.clone(), tx);
    controller.reconcile(at(25, 23, 0));
    controller.emergency_reset();
    assert!(!app.gate.is_active());

    // Daemon restarts later the same night
    drop(daemon);
    let mut daemon = Daemon::start(dir.path(), at(25, 23, 30));
    assert!(!daemon.process.gate.is_active());
    assert!(app.store.load_session().is_none());

    daemon.tick(at(26, 22, 0));
    assert!(daemon.process.gate.is_active());
}
