//! Tracking errors

use chrono::{DateTime, Utc};
use dwell_api::ErrorCode;
use dwell_store::StoreError;
use dwell_util::SubsectionId;
use thiserror::Error;

/// Per-request outcome of a rejected tracking operation
#[derive(Debug, Clone, Error)]
pub enum TrackingError {
    #[error("No open session for subsection {0}")]
    SessionNotFound(SubsectionId),

    #[error("Subsection {0} not found")]
    SubsectionNotFound(SubsectionId),

    #[error("Too many heartbeats; retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Heartbeat {elapsed_secs:.1}s after the previous one; minimum is {min_secs}s")]
    TooFrequent { elapsed_secs: f64, min_secs: u64 },

    #[error("Heartbeat timing is too regular ({window} intervals of ~{interval_secs:.2}s)")]
    SuspiciousRegularity { interval_secs: f64, window: usize },

    #[error("Too many active sessions: {active} (maximum {max})")]
    TooManyActiveSessions { active: usize, max: usize },

    #[error("Verification required until {until}")]
    VerificationRequired { until: DateTime<Utc> },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl TrackingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TrackingError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            TrackingError::SubsectionNotFound(_) => ErrorCode::SubsectionNotFound,
            TrackingError::RateLimited { .. } => ErrorCode::RateLimited,
            TrackingError::TooFrequent { .. } => ErrorCode::TooFrequent,
            TrackingError::SuspiciousRegularity { .. } => ErrorCode::SuspiciousRegularity,
            TrackingError::TooManyActiveSessions { .. } => ErrorCode::TooManyActiveSessions,
            TrackingError::VerificationRequired { .. } => ErrorCode::VerificationRequired,
            TrackingError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }

    /// Advisory delay before the same request can succeed, when it is known
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            TrackingError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            TrackingError::TooFrequent {
                elapsed_secs,
                min_secs,
            } => Some((*min_secs as f64 - elapsed_secs).ceil().max(1.0) as u64),
            TrackingError::StoreUnavailable(_) => Some(1),
            _ => None,
        }
    }
}

impl From<StoreError> for TrackingError {
    fn from(e: StoreError) -> Self {
        TrackingError::StoreUnavailable(e.to_string())
    }
}
