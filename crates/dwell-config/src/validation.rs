//! Configuration validation

use crate::schema::{RawConfig, RawServiceConfig, RawSubsection, RawTrackingConfig};
use crate::policy::TrackingParams;
use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

/// Longest duration accepted for any `*_seconds` tracking key (ten years)
pub const MAX_DURATION_SECONDS: u64 = 10 * 365 * 24 * 3600;

/// Longest accepted heartbeat retention
pub const MAX_RETENTION_HOURS: u64 = MAX_DURATION_SECONDS / 3600;

/// Longest accepted wait for a record lock or the database
pub const MAX_STORE_TIMEOUT_MS: u64 = 10 * 60 * 1000;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Subsection {subsection_id}: {message}")]
    SubsectionError { subsection_id: i64, message: String },

    #[error("Duplicate subsection ID: {0}")]
    DuplicateSubsectionId(i64),

    #[error("Invalid listen address '{value}': {message}")]
    InvalidListenAddr { value: String, message: String },

    #[error("tracking.{key}: {message}")]
    TrackingError { key: &'static str, message: String },

    #[error("service.{key}: {message}")]
    ServiceError { key: &'static str, message: String },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_service(&config.service));
    errors.extend(validate_tracking(&config.tracking));

    // Check for duplicate subsection IDs
    let mut seen_ids = HashSet::new();
    for subsection in &config.subsections {
        if !seen_ids.insert(subsection.id) {
            errors.push(ValidationError::DuplicateSubsectionId(subsection.id));
        }
    }

    for subsection in &config.subsections {
        errors.extend(validate_subsection(subsection));
    }

    errors
}

fn validate_service(service: &RawServiceConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(addr) = &service.listen_addr
        && let Err(e) = addr.parse::<SocketAddr>()
    {
        errors.push(ValidationError::InvalidListenAddr {
            value: addr.clone(),
            message: e.to_string(),
        });
    }

    let mut in_range = |key: &'static str, value: Option<u64>, max: u64| match value {
        Some(0) => errors.push(ValidationError::ServiceError {
            key,
            message: "must be greater than 0".into(),
        }),
        Some(v) if v > max => errors.push(ValidationError::ServiceError {
            key,
            message: format!("{v} exceeds the maximum of {max}"),
        }),
        _ => {}
    };
    in_range("store_timeout_ms", service.store_timeout_ms, MAX_STORE_TIMEOUT_MS);
    in_range(
        "heartbeat_retention_hours",
        service.heartbeat_retention_hours,
        MAX_RETENTION_HOURS,
    );

    errors
}

fn validate_tracking(raw: &RawTrackingConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let defaults = TrackingParams::default();

    let mut duration = |key: &'static str, value: Option<u64>| match value {
        Some(0) => errors.push(ValidationError::TrackingError {
            key,
            message: "must be greater than 0".into(),
        }),
        Some(v) if v > MAX_DURATION_SECONDS => errors.push(ValidationError::TrackingError {
            key,
            message: format!("{v}s exceeds the maximum of {MAX_DURATION_SECONDS}s"),
        }),
        _ => {}
    };
    duration("heartbeat_interval_seconds", raw.heartbeat_interval_seconds);
    duration("min_interval_seconds", raw.min_interval_seconds);
    duration("max_increment_seconds", raw.max_increment_seconds);
    duration("max_session_seconds", raw.max_session_seconds);
    duration("session_activity_window_seconds", raw.session_activity_window_seconds);
    duration("bot_window_seconds", raw.bot_window_seconds);
    duration("verification_ttl_seconds", raw.verification_ttl_seconds);

    // Cross-field checks use the effective values
    let interval = raw
        .heartbeat_interval_seconds
        .unwrap_or(defaults.heartbeat_interval.as_secs());
    let min_interval = raw
        .min_interval_seconds
        .unwrap_or(defaults.min_interval.as_secs());
    let max_increment = raw
        .max_increment_seconds
        .unwrap_or(defaults.max_increment.as_secs());

    if min_interval > interval {
        errors.push(ValidationError::TrackingError {
            key: "min_interval_seconds",
            message: format!(
                "{}s exceeds heartbeat_interval_seconds ({}s); every heartbeat would be rejected",
                min_interval, interval
            ),
        });
    }

    if max_increment < interval {
        errors.push(ValidationError::TrackingError {
            key: "max_increment_seconds",
            message: format!(
                "{}s is below heartbeat_interval_seconds ({}s)",
                max_increment, interval
            ),
        });
    }

    if let Some(band) = raw.regularity_band_seconds
        && !(band > 0.0 && band < interval as f64)
    {
        errors.push(ValidationError::TrackingError {
            key: "regularity_band_seconds",
            message: format!("must be within (0, {})", interval),
        });
    }

    if raw.regularity_window == Some(0) {
        errors.push(ValidationError::TrackingError {
            key: "regularity_window",
            message: "must be at least 1".into(),
        });
    }

    if raw.rate_limit_per_minute == Some(0) {
        errors.push(ValidationError::TrackingError {
            key: "rate_limit_per_minute",
            message: "must be at least 1".into(),
        });
    }

    if raw.max_parallel_sessions == Some(0) {
        errors.push(ValidationError::TrackingError {
            key: "max_parallel_sessions",
            message: "must be at least 1".into(),
        });
    }

    if let Some(samples) = raw.bot_min_samples
        && samples < 2
    {
        errors.push(ValidationError::TrackingError {
            key: "bot_min_samples",
            message: "a standard deviation needs at least 2 samples".into(),
        });
    }

    if let Some(threshold) = raw.bot_stddev_threshold
        && !(threshold >= 0.0)
    {
        errors.push(ValidationError::TrackingError {
            key: "bot_stddev_threshold",
            message: "must be non-negative".into(),
        });
    }

    if raw.default_min_time_seconds == Some(0) {
        errors.push(ValidationError::TrackingError {
            key: "default_min_time_seconds",
            message: "must be greater than 0".into(),
        });
    }

    errors
}

fn validate_subsection(subsection: &RawSubsection) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if subsection.min_time_seconds == Some(0) {
        errors.push(ValidationError::SubsectionError {
            subsection_id: subsection.id,
            message: "min_time_seconds must be greater than 0".into(),
        });
    }

    if subsection.required_time_minutes == Some(0) {
        errors.push(ValidationError::SubsectionError {
            subsection_id: subsection.id,
            message: "required_time_minutes must be greater than 0 (omit it for none)".into(),
        });
    }

    errors
}
