//! Store trait definitions

use chrono::{DateTime, Utc};
use dwell_util::{ProgressKey, UserId};

use crate::{AuditEvent, HeartbeatSample, ProgressRecord, StoreResult};

/// Main store trait
pub trait Store: Send + Sync {
    // Progress records

    /// Load the record for a (learner, subsection) pair
    fn get_progress(&self, key: &ProgressKey) -> StoreResult<Option<ProgressRecord>>;

    /// Insert or replace a record
    fn save_progress(&self, record: &ProgressRecord) -> StoreResult<()>;

    /// Save a record and log the heartbeat that produced it, atomically
    fn commit_heartbeat(
        &self,
        record: &ProgressRecord,
        sample: &HeartbeatSample,
    ) -> StoreResult<()>;

    /// Count a learner's open sessions whose latest heartbeat or start is at or after `active_since`
    fn count_open_sessions(&self, user_id: UserId, active_since: DateTime<Utc>)
        -> StoreResult<usize>;

    /// All records belonging to a learner
    fn list_progress_for_user(&self, user_id: UserId) -> StoreResult<Vec<ProgressRecord>>;

    // Heartbeat log

    /// Intervals of the most recent heartbeats on one record, newest first.
    /// `None` marks a heartbeat with no prior activity to measure against.
    fn recent_intervals(&self, key: &ProgressKey, limit: usize) -> StoreResult<Vec<Option<f64>>>;

    /// Measured intervals of a learner's heartbeats at or after `since`, across all subsections
    fn user_intervals_since(&self, user_id: UserId, since: DateTime<Utc>) -> StoreResult<Vec<f64>>;

    /// Delete heartbeat samples older than `before`; returns how many were removed
    fn prune_heartbeats(&self, before: DateTime<Utc>) -> StoreResult<usize>;

    // Verification markers

    /// Expiry of a learner's verification-required marker
    fn get_verification_until(&self, user_id: UserId) -> StoreResult<Option<DateTime<Utc>>>;

    /// Require verification until the given time
    fn set_verification_until(&self, user_id: UserId, until: DateTime<Utc>) -> StoreResult<()>;

    /// Clear a learner's marker
    fn clear_verification(&self, user_id: UserId) -> StoreResult<()>;

    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
