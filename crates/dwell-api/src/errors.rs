//! Error body shared by all endpoints

use serde::{Deserialize, Serialize};

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
    /// Advisory delay before retrying, when one is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retry_after_seconds: None,
        }
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after_seconds = Some(seconds);
        self
    }
}

/// Error codes for the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthenticated,
    SubsectionNotFound,
    SessionNotFound,
    RateLimited,
    TooFrequent,
    SuspiciousRegularity,
    TooManyActiveSessions,
    VerificationRequired,
    StoreUnavailable,
    InternalError,
}

impl ErrorCode {
    /// Whether a client may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::RateLimited
                | ErrorCode::TooFrequent
                | ErrorCode::SuspiciousRegularity
                | ErrorCode::TooManyActiveSessions
                | ErrorCode::StoreUnavailable
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_snake_case() {
        let json = serde_json::to_string(&ErrorCode::TooManyActiveSessions).unwrap();
        assert_eq!(json, "\"too_many_active_sessions\"");
    }

    #[test]
    fn retry_after_is_omitted_when_unknown() {
        let info = ErrorInfo::new(ErrorCode::SessionNotFound, "no open session");
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("retry_after_seconds").is_none());

        let info = ErrorInfo::new(ErrorCode::RateLimited, "slow down").with_retry_after(12);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["retry_after_seconds"], 12);
    }

    #[test]
    fn verification_is_not_retryable() {
        assert!(!ErrorCode::VerificationRequired.is_retryable());
        assert!(ErrorCode::StoreUnavailable.is_retryable());
    }
}
