//! Host adapter trait interfaces for sleepguard
//!
//! This crate defines the capability-based interface between the session
//! core and platform-specific implementations. It contains no platform code
//! itself, only the traits, the shield rule model, and in-memory mocks.

mod mock;
mod rules;
mod traits;

pub use mock::*;
pub use rules::*;
pub use traits::*;
