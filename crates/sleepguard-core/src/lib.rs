//! Session lifecycle core for sleepguard
//!
//! This crate is the heart of sleepguard, containing:
//! - Session state machine (NoSession -> Active -> Cancelling -> NoSession)
//! - The abortable cancel countdown and its ticker
//! - Cold-start reconciliation against the shared store
//! - The background interval reactor
//! - Schedule and allow-list settings

mod controller;
mod countdown;
mod events;
mod reactor;
mod session;
mod settings;

pub use controller::*;
pub use countdown::*;
pub use events::*;
pub use reactor::*;
pub use session::*;
pub use settings::*;
