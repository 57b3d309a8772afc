//! Response bodies for the dwelld API

use chrono::{DateTime, Utc};
use dwell_util::{SessionId, SubsectionId, UserId};
use serde::{Deserialize, Serialize};

/// One closed viewing session, as kept in a record's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: u64,
}

/// `POST /subsections/progress/{id}/start`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResponse {
    pub session_id: SessionId,
    pub subsection_id: SubsectionId,
    pub started_at: DateTime<Utc>,
    pub time_spent_seconds: u64,
    pub completion_percentage: f64,
    pub is_completed: bool,
}

/// `POST /subsections/progress/{id}/heartbeat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub time_spent_seconds: u64,
    pub completion_percentage: f64,
    pub is_completed: bool,
    pub next_heartbeat_in_seconds: u64,
}

/// Persisted progress snapshot, returned by `complete`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressView {
    pub user_id: UserId,
    pub subsection_id: SubsectionId,
    pub time_spent_seconds: u64,
    pub completion_percentage: f64,
    pub is_completed: bool,
    pub is_viewed: bool,
    pub viewed_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub session_start_at: Option<DateTime<Utc>>,
    pub session_history: Vec<SessionEntry>,
}

/// `GET /subsections/progress/{id}/status`
///
/// Read-only; a learner who never opened the subsection gets `exists = false`
/// and zeroed values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressStatus {
    pub exists: bool,
    pub time_spent_seconds: u64,
    pub completion_percentage: f64,
    pub is_completed: bool,
    pub is_viewed: bool,
    pub viewed_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub session_active: bool,
}

/// `GET /subsections/progress/summary`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySummary {
    pub user_id: UserId,
    pub total_time_spent_seconds: u64,
    pub subsections_started: usize,
    pub subsections_completed: usize,
}

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub api_version: u32,
    pub version: String,
    pub store_healthy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn heartbeat_response_field_names() {
        let resp = HeartbeatResponse {
            time_spent_seconds: 30,
            completion_percentage: 100.0,
            is_completed: true,
            next_heartbeat_in_seconds: 15,
        };

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["time_spent_seconds"], 30);
        assert_eq!(json["completion_percentage"], 100.0);
        assert_eq!(json["is_completed"], true);
        assert_eq!(json["next_heartbeat_in_seconds"], 15);
    }

    #[test]
    fn status_defaults_to_not_existing() {
        let status = ProgressStatus::default();
        assert!(!status.exists);
        assert_eq!(status.time_spent_seconds, 0);
        assert!(!status.session_active);
    }

    #[test]
    fn session_entry_serializes_timestamps() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let entry = SessionEntry {
            start,
            end: start + chrono::Duration::seconds(90),
            duration_seconds: 90,
        };

        let json = serde_json::to_string(&entry).unwrap();
        let parsed: SessionEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }
}
