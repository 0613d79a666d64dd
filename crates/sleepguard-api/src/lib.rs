//! Shared data model for sleepguard
//!
//! This crate defines the records shared by the foreground app and the
//! background monitor:
//! - Sessions, strictness, and the recurring schedule
//! - The allow-list exempted from blocking
//! - Monitored interval schedules
//! - The state snapshot exposed to presentation

mod interval;
mod types;

pub use interval::*;
pub use types::*;

/// Length of the Flexible cancellation countdown, in seconds
pub const CANCEL_COUNTDOWN_SECS: u32 = 30;
