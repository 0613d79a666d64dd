//! Store trait definitions

use crate::{AuditEvent, StoreResult};

/// Main store trait
///
/// Values are JSON documents keyed by record name. Implementations must be
/// safe to open from several processes at once.
pub trait Store: Send + Sync {
    // Records

    /// Replace the record stored under `key`
    fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Read the record stored under `key`
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Remove the record stored under `key` (no-op when absent)
    fn delete(&self, key: &str) -> StoreResult<()>;

    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
