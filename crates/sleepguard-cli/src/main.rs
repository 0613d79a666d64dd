//! sleepguard - Command-line front end
//!
//! Starts, watches, and cancels blocking sessions, and edits the nightly
//! schedule and allow-list. Session state lives in the shared store, so the
//! background monitor (sleepguardd) keeps enforcing after this exits.

mod app;
mod commands;
mod input;
mod state;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sleepguard_api::{AllowKind, StrictnessPolicy};
use sleepguard_config::load_config_or_default;
use sleepguard_util::{WallClock, default_config_path};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::input::parse_duration_minutes;

/// sleepguard - Block distracting apps and sites for a while
#[derive(Parser, Debug)]
#[command(name = "sleepguard")]
#[command(about = "Block distracting apps and sites for a while", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/sleepguard/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set SLEEPGUARD_DATA_DIR env var)
    #[arg(short, long, env = "SLEEPGUARD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Shield rules file override
    #[arg(short, long, env = "SLEEPGUARD_RULES_PATH")]
    rules_path: Option<PathBuf>,

    /// Log level (logs go to stderr)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a manual session and show the session screen
    Start {
        /// Length: a preset (30m, 1h, 2h, 4h, 6h, 8h), `<n>h`, or minutes
        #[arg(value_parser = parse_duration_minutes)]
        duration: Option<u32>,

        /// Strictness (default: the saved default strictness)
        #[arg(short, long)]
        strictness: Option<StrictnessPolicy>,

        /// Return immediately instead of showing the session screen
        #[arg(long)]
        detach: bool,
    },

    /// Show the session screen for the running session
    Watch,

    /// Cancel a flexible session after the countdown
    Cancel,

    /// Show the current session
    Status {
        /// Print the session snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove all blocking and forget the current session
    Reset,

    /// Grant permission to apply blocking rules
    Authorize,

    /// Nightly schedule
    Schedule {
        #[command(subcommand)]
        action: Option<ScheduleAction>,
    },

    /// Applications, categories, and domains exempt from blocking
    Allow {
        #[command(subcommand)]
        action: Option<AllowAction>,
    },

    /// Default strictness for manual sessions
    Strictness {
        #[command(subcommand)]
        action: Option<StrictnessAction>,
    },

    /// Recent audit log entries, oldest first
    Audit {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum ScheduleAction {
    /// Show the schedule
    Show,
    /// Change the schedule window or strictness
    Set {
        /// Start time, HH:MM
        #[arg(long)]
        start: Option<WallClock>,
        /// End time, HH:MM (may be earlier than start for overnight windows)
        #[arg(long)]
        end: Option<WallClock>,
        #[arg(short, long)]
        strictness: Option<StrictnessPolicy>,
        /// Also enable the schedule
        #[arg(long)]
        enable: bool,
    },
    /// Enable the schedule
    Enable,
    /// Disable the schedule
    Disable,
}

#[derive(Subcommand, Debug)]
enum StrictnessAction {
    /// Show the default strictness
    Get,
    /// Change the default strictness (strict, flexible)
    Set { value: StrictnessPolicy },
}

#[derive(Subcommand, Debug)]
enum AllowAction {
    /// List allowed entries
    Show,
    /// Allow an entry (kind: app, category, domain)
    Add { kind: AllowKind, token: String },
    /// Remove an entry
    Remove { kind: AllowKind, token: String },
    /// Remove every entry
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    if let Some(data_dir) = args.data_dir {
        config.daemon.data_dir = data_dir;
    }
    if let Some(rules_path) = args.rules_path {
        config.daemon.rules_path = rules_path;
    }

    if sleepguard_util::is_mock_time_active() {
        tracing::warn!(now = %sleepguard_util::now(), "Mock time is active");
    }

    let app = App::open(config)?;

    match args.command {
        Command::Start {
            duration,
            strictness,
            detach,
        } => {
            let minutes = duration.unwrap_or(app.config.session.default_minutes);
            commands::start(&app, minutes, strictness, detach).await
        }
        Command::Watch => commands::watch(&app).await,
        Command::Cancel => commands::cancel(&app).await,
        Command::Status { json } => commands::status(&app, json),
        Command::Reset => commands::reset(&app),
        Command::Authorize => commands::authorize(&app).await,
        Command::Schedule { action } => match action.unwrap_or(ScheduleAction::Show) {
            ScheduleAction::Show => commands::schedule_show(&app),
            ScheduleAction::Set {
                start,
                end,
                strictness,
                enable,
            } => commands::schedule_set(&app, start, end, strictness, enable),
            ScheduleAction::Enable => commands::schedule_enable(&app, true),
            ScheduleAction::Disable => commands::schedule_enable(&app, false),
        },
        Command::Allow { action } => match action.unwrap_or(AllowAction::Show) {
            AllowAction::Show => commands::allow_show(&app),
            AllowAction::Add { kind, token } => commands::allow_add(&app, kind, &token),
            AllowAction::Remove { kind, token } => commands::allow_remove(&app, kind, &token),
            AllowAction::Clear => commands::allow_clear(&app),
        },
        Command::Strictness { action } => match action.unwrap_or(StrictnessAction::Get) {
            StrictnessAction::Get => commands::strictness_get(&app),
            StrictnessAction::Set { value } => commands::strictness_set(&app, value),
        },
        Command::Audit { limit } => commands::audit(&app, limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn parses_start_with_preset() {
        let args = Args::try_parse_from(["sleepguard", "start", "2h", "--strictness", "strict"])
            .unwrap();
        match args.command {
            Command::Start {
                duration,
                strictness,
                detach,
            } => {
                assert_eq!(duration, Some(120));
                assert_eq!(strictness, Some(StrictnessPolicy::Strict));
                assert!(!detach);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn rejects_out_of_range_duration() {
        assert!(Args::try_parse_from(["sleepguard", "start", "0"]).is_err());
    }

    #[test]
    fn parses_schedule_set() {
        let args = Args::try_parse_from([
            "sleepguard", "schedule", "set", "--start", "22:30", "--end", "06:45", "--enable",
        ])
        .unwrap();
        match args.command {
            Command::Schedule {
                action: Some(ScheduleAction::Set { start, end, enable, .. }),
            } => {
                assert_eq!(start, WallClock::new(22, 30));
                assert_eq!(end, WallClock::new(6, 45));
                assert!(enable);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_strictness_set() {
        let args = Args::try_parse_from(["sleepguard", "strictness", "set", "strict"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Strictness {
                action: Some(StrictnessAction::Set {
                    value: StrictnessPolicy::Strict
                })
            }
        ));
    }

    #[test]
    fn parses_allow_add() {
        let args =
            Args::try_parse_from(["sleepguard", "allow", "add", "domain", "example.com"]).unwrap();
        match args.command {
            Command::Allow {
                action: Some(AllowAction::Add { kind, token }),
            } => {
                assert_eq!(kind, AllowKind::WebDomain);
                assert_eq!(token, "example.com");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
