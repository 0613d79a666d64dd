//! Command implementations

use anyhow::{Result, bail};
use sleepguard_api::{AllowKind, StrictnessPolicy};
use sleepguard_core::{ControllerEvent, CountdownTick, SessionController};
use sleepguard_util::{SleepguardError, WallClock};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::app::App;
use crate::input::{ScreenCommand, line_to_command};
use crate::state::{ScreenState, describe_event, describe_schedule};

/// Print events; true if one of them ended the session
fn report(events: &[ControllerEvent]) -> bool {
    let mut ended = false;
    for event in events {
        match event {
            ControllerEvent::MonitoringDegraded { .. } => eprintln!("{}", describe_event(event)),
            _ => println!("{}", describe_event(event)),
        }
        if matches!(
            event,
            ControllerEvent::SessionEnded { .. } | ControllerEvent::EmergencyReset { .. }
        ) {
            ended = true;
        }
    }
    ended
}

fn render(controller: &SessionController) {
    let now = sleepguard_util::now();
    println!("{}", ScreenState::from_snapshot(&controller.snapshot(now), now).render());
}

pub async fn start(
    app: &App,
    minutes: u32,
    strictness: Option<StrictnessPolicy>,
    detach: bool,
) -> Result<()> {
    app.require_authorization()?;

    let strictness = strictness.unwrap_or_else(|| app.preferences().default_strictness());
    let (mut controller, mut rx) = app.controller();
    let now = sleepguard_util::now();

    controller.reconcile(now);
    let events = controller.start_manual(minutes, strictness, now)?;
    report(&events);

    if detach {
        return Ok(());
    }
    session_screen(app, &mut controller, &mut rx).await
}

pub async fn watch(app: &App) -> Result<()> {
    app.require_authorization()?;

    let (mut controller, mut rx) = app.controller();
    let events = controller.reconcile(sleepguard_util::now());
    report(&events);

    if !controller.has_active_session(sleepguard_util::now()) {
        println!("No active session");
        return Ok(());
    }
    session_screen(app, &mut controller, &mut rx).await
}

/// Interactive session screen: one command per line on stdin
async fn session_screen(
    app: &App,
    controller: &mut SessionController,
    rx: &mut UnboundedReceiver<CountdownTick>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let mut expiry = tokio::time::interval(app.config.session.expiry_poll);
    expiry.set_missed_tick_behavior(MissedTickBehavior::Delay);

    render(controller);

    loop {
        tokio::select! {
            _ = expiry.tick() => {
                let now = sleepguard_util::now();
                let mut events = controller.reconcile(now);
                events.extend(controller.check_expiry(now));
                if report(&events) || !controller.has_active_session(now) {
                    break;
                }
            }

            Some(tick) = rx.recv() => {
                if report(&controller.on_countdown_tick(tick)) {
                    break;
                }
            }

            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    stdin_open = false;
                    continue;
                };
                match line_to_command(&line) {
                    Some(ScreenCommand::Cancel) => match controller.begin_cancel() {
                        Some(event) => {
                            report(&[event]);
                        }
                        None => println!("This session cannot be cancelled"),
                    },
                    Some(ScreenCommand::Abort) => {
                        if let Some(event) = controller.abort_cancel() {
                            report(&[event]);
                        }
                    }
                    Some(ScreenCommand::Reset) => {
                        report(&[controller.emergency_reset()]);
                        break;
                    }
                    Some(ScreenCommand::Quit) => {
                        if let Some(event) = controller.abort_cancel() {
                            report(&[event]);
                        }
                        println!("Leaving; blocking stays active until the session ends");
                        break;
                    }
                    None => render(controller),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                if let Some(event) = controller.abort_cancel() {
                    report(&[event]);
                }
                break;
            }
        }
    }

    Ok(())
}

/// Run the cancel countdown to completion; Ctrl-C aborts it
pub async fn cancel(app: &App) -> Result<()> {
    app.require_authorization()?;

    let (mut controller, mut rx) = app.controller();
    let now = sleepguard_util::now();
    controller.reconcile(now);

    if !controller.has_active_session(now) {
        return Err(SleepguardError::NoActiveSession.into());
    }
    let Some(event) = controller.begin_cancel() else {
        bail!("the active session is strict and cannot be cancelled");
    };
    report(&[event]);
    println!("Press Ctrl-C to keep the session");

    loop {
        tokio::select! {
            Some(tick) = rx.recv() => {
                if report(&controller.on_countdown_tick(tick)) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if let Some(event) = controller.abort_cancel() {
                    report(&[event]);
                }
                break;
            }
        }
    }
    Ok(())
}

pub fn status(app: &App, json: bool) -> Result<()> {
    let now = sleepguard_util::now();
    let snapshot = SessionController::stored_snapshot(&app.store, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{}", ScreenState::from_snapshot(&snapshot, now).render());
    }
    Ok(())
}

pub fn reset(app: &App) -> Result<()> {
    let (mut controller, _rx) = app.controller();
    report(&[controller.emergency_reset()]);
    Ok(())
}

pub async fn authorize(app: &App) -> Result<()> {
    let status = app.authorize().await?;
    println!("Authorization: {:?}", status);
    Ok(())
}

pub fn schedule_show(app: &App) -> Result<()> {
    println!("{}", describe_schedule(&app.schedule_settings().load()));
    Ok(())
}

pub fn schedule_set(
    app: &App,
    start: Option<WallClock>,
    end: Option<WallClock>,
    strictness: Option<StrictnessPolicy>,
    enable: bool,
) -> Result<()> {
    let settings = app.schedule_settings();
    let mut schedule = settings.load();

    if let Some(start) = start {
        schedule.set_start(start);
    }
    if let Some(end) = end {
        schedule.set_end(end);
    }
    if let Some(strictness) = strictness {
        schedule.strictness = strictness;
    }
    if enable {
        schedule.enabled = true;
    }

    report(&settings.save(&schedule)?);
    println!("{}", describe_schedule(&schedule));
    Ok(())
}

pub fn schedule_enable(app: &App, enabled: bool) -> Result<()> {
    let settings = app.schedule_settings();
    report(&settings.set_enabled(enabled)?);
    println!("{}", describe_schedule(&settings.load()));
    Ok(())
}

pub fn allow_show(app: &App) -> Result<()> {
    let list = app.preferences().allow_list();
    if list.is_empty() {
        println!("Allow-list is empty; everything is blocked during a session");
        return Ok(());
    }
    for (title, tokens) in [
        ("Applications", &list.applications),
        ("Categories", &list.categories),
        ("Web domains", &list.web_domains),
    ] {
        if tokens.is_empty() {
            continue;
        }
        println!("{}:", title);
        for token in tokens {
            println!("  {}", token);
        }
    }
    Ok(())
}

pub fn allow_add(app: &App, kind: AllowKind, token: &str) -> Result<()> {
    if app.preferences().allow(kind, token)? {
        println!("Allowed {}", token);
    } else {
        println!("{} is already allowed", token);
    }
    Ok(())
}

pub fn allow_remove(app: &App, kind: AllowKind, token: &str) -> Result<()> {
    if app.preferences().disallow(kind, token)? {
        println!("Removed {}", token);
    } else {
        println!("{} was not on the allow-list", token);
    }
    Ok(())
}

pub fn allow_clear(app: &App) -> Result<()> {
    app.preferences().clear_allow_list()?;
    println!("Allow-list cleared");
    Ok(())
}

pub fn strictness_get(app: &App) -> Result<()> {
    let strictness = app.preferences().default_strictness();
    println!("{} ({})", strictness.display_name(), strictness.description());
    Ok(())
}

pub fn strictness_set(app: &App, strictness: StrictnessPolicy) -> Result<()> {
    app.preferences().set_default_strictness(strictness)?;
    println!("Default strictness: {}", strictness.display_name());
    Ok(())
}

pub fn audit(app: &App, limit: usize) -> Result<()> {
    let events = app
        .store
        .raw()
        .get_recent_audits(limit)
        .map_err(|e| SleepguardError::store(e.to_string()))?;
    for event in events.iter().rev() {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}
