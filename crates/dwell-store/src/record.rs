//! Persisted progress types

use chrono::{DateTime, Utc};
use dwell_api::SessionEntry;
use dwell_util::{ProgressKey, SessionId};
use serde::{Deserialize, Serialize};

/// Progress of one learner through one subsection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub key: ProgressKey,

    /// Identifier of the open session, if any
    pub session_id: Option<SessionId>,

    /// Cumulative validated time; never decreases
    pub time_spent_seconds: u64,

    /// Time of the last accepted heartbeat
    pub last_activity_at: Option<DateTime<Utc>>,

    /// Set while a session is open
    pub session_start_at: Option<DateTime<Utc>>,

    pub completion_percentage: f64,

    /// Sticky once set
    pub is_completed: bool,

    /// Set together with `is_completed`, also sticky
    pub is_viewed: bool,
    pub viewed_at: Option<DateTime<Utc>>,

    /// Closed sessions, oldest first
    pub session_history: Vec<SessionEntry>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// A fresh record with no time and no session
    pub fn new(key: ProgressKey, now: DateTime<Utc>) -> Self {
        Self {
            key,
            session_id: None,
            time_spent_seconds: 0,
            last_activity_at: None,
            session_start_at: None,
            completion_percentage: 0.0,
            is_completed: false,
            is_viewed: false,
            viewed_at: None,
            session_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_session_open(&self) -> bool {
        self.session_start_at.is_some()
    }
}

/// One accepted heartbeat as kept in the heartbeat log
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatSample {
    pub key: ProgressKey,
    pub at: DateTime<Utc>,
    /// Seconds since the previous accepted heartbeat on the same record;
    /// `None` when the record had no prior activity
    pub interval_secs: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dwell_util::{SubsectionId, UserId};

    #[test]
    fn new_record_is_idle() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let key = ProgressKey::new(UserId::new(1), SubsectionId::new(2));
        let record = ProgressRecord::new(key, now);

        assert!(!record.is_session_open());
        assert_eq!(record.time_spent_seconds, 0);
        assert!(record.session_history.is_empty());
        assert_eq!(record.created_at, now);
    }
}
