//! Linux host adapter for sleepguard
//!
//! Provides:
//! - Shield rules committed atomically to a JSON rules file
//! - Interval registrations persisted in the shared store
//! - Boundary computation for the background daemon
//! - Local authorization based on access to the rules directory

mod authorization;
mod gate;
mod monitor;
mod scheduler;

pub use authorization::*;
pub use gate::*;
pub use monitor::*;
pub use scheduler::*;
