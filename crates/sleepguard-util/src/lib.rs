//! Shared utilities for sleepguard
//!
//! This crate provides:
//! - ID types (SessionId, IntervalName)
//! - Time utilities (mockable local clock, wall-clock times, duration formatting)
//! - Error types
//! - Default paths for config, data, and shield rule files

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
