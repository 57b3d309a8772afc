//! Mapping of tracking outcomes to HTTP responses

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use dwell_api::{ErrorCode, ErrorInfo};
use dwell_core::TrackingError;

/// Error returned by every handler
#[derive(Debug)]
pub enum ApiError {
    Unauthenticated(String),
    Tracking(TrackingError),
}

impl From<TrackingError> for ApiError {
    fn from(e: TrackingError) -> Self {
        ApiError::Tracking(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Tracking(e) => match e {
                TrackingError::SessionNotFound(_) | TrackingError::SubsectionNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                TrackingError::RateLimited { .. }
                | TrackingError::TooFrequent { .. }
                | TrackingError::SuspiciousRegularity { .. }
                | TrackingError::TooManyActiveSessions { .. } => StatusCode::TOO_MANY_REQUESTS,
                TrackingError::VerificationRequired { .. } => StatusCode::FORBIDDEN,
                TrackingError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }

    fn info(&self) -> ErrorInfo {
        match self {
            ApiError::Unauthenticated(message) => {
                ErrorInfo::new(ErrorCode::Unauthenticated, message.clone())
            }
            ApiError::Tracking(e) => {
                let info = ErrorInfo::new(e.code(), e.to_string());
                match e.retry_after_secs() {
                    Some(secs) => info.with_retry_after(secs),
                    None => info,
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let info = self.info();

        let mut response = (status, Json(&info)).into_response();
        if let Some(secs) = info.retry_after_seconds {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
