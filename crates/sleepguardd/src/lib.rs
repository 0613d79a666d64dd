//! sleepguardd - The sleepguard background monitor
//!
//! The binary wires configuration, the store, and the Linux gate around
//! [`BackgroundMonitor`], which holds the loop body so it can be driven
//! directly in tests.

mod monitor;

pub use monitor::*;
