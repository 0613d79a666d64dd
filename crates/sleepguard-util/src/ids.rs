//! Strongly-typed identifiers for sleepguard

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a blocking session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a monitored interval registered with the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntervalName(String);

impl IntervalName {
    /// One-shot interval backing a manual session
    pub const MANUAL_SESSION: &'static str = "sleepSession";

    /// Repeating interval backing the recurring nightly schedule
    pub const NIGHTLY_SCHEDULE: &'static str = "nightlySchedule";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn manual_session() -> Self {
        Self::new(Self::MANUAL_SESSION)
    }

    pub fn nightly_schedule() -> Self {
        Self::new(Self::NIGHTLY_SCHEDULE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntervalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IntervalName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IntervalName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_uniqueness() {
        let s1 = SessionId::new();
        let s2 = SessionId::new();
        assert_ne!(s1, s2);
    }

    #[test]
    fn well_known_interval_names() {
        assert_eq!(IntervalName::manual_session().as_str(), "sleepSession");
        assert_eq!(IntervalName::nightly_schedule().as_str(), "nightlySchedule");
        assert_eq!(IntervalName::from("sleepSession"), IntervalName::manual_session());
    }

    #[test]
    fn ids_serialize_deserialize() {
        let session_id = SessionId::new();
        let json = serde_json::to_string(&session_id).unwrap();
        let parsed: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(session_id, parsed);

        let name = IntervalName::nightly_schedule();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"nightlySchedule\"");
    }
}
