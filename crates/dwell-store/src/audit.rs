//! Audit event types

use chrono::{DateTime, Utc};
use dwell_util::{SessionId, SubsectionId, UserId};
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Service stopped
    ServiceStopped,

    /// Configuration loaded
    ConfigLoaded { subsection_count: usize },

    /// Session opened by `start`
    SessionOpened {
        user_id: UserId,
        subsection_id: SubsectionId,
        session_id: SessionId,
    },

    /// Session closed, either by `complete` or because a new `start` found it still open
    SessionClosed {
        user_id: UserId,
        subsection_id: SubsectionId,
        session_id: Option<SessionId>,
        duration_seconds: u64,
        stale: bool,
    },

    /// Session ran past the continuous-duration bound and was restarted
    SessionRotated {
        user_id: UserId,
        subsection_id: SubsectionId,
        open_for_seconds: u64,
    },

    /// Completion reached for the first time
    SubsectionCompleted {
        user_id: UserId,
        subsection_id: SubsectionId,
        time_spent_seconds: u64,
    },

    /// Heartbeat timing looked automated; verification is now required
    BotFlagged {
        user_id: UserId,
        stddev_seconds: f64,
        samples: usize,
        until: DateTime<Utc>,
    },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp,
            event,
        }
    }
}
