//! Validated configuration structures

use crate::schema::{RawConfig, RawServiceConfig, RawSubsection, RawTrackingConfig};
use dwell_util::{SubsectionId, default_data_dir};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Validated configuration ready for use by the service
#[derive(Debug, Clone, Default)]
pub struct TrackingConfig {
    /// Service configuration
    pub service: ServiceConfig,

    /// Heartbeat timing contract and anti-abuse thresholds
    pub tracking: TrackingParams,

    /// Subsection completion thresholds
    pub subsections: Vec<SubsectionPolicy>,
}

impl TrackingConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let tracking = TrackingParams::from_raw(&raw.tracking);
        let subsections = raw
            .subsections
            .into_iter()
            .map(|s| SubsectionPolicy::from_raw(s, tracking.default_min_time_seconds))
            .collect();

        Self {
            service: ServiceConfig::from_raw(raw.service),
            tracking,
            subsections,
        }
    }

    /// Get subsection policy by ID
    pub fn get_subsection(&self, id: SubsectionId) -> Option<&SubsectionPolicy> {
        self.subsections.iter().find(|s| s.subsection_id == id)
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub store_timeout: Duration,
    pub heartbeat_retention: Duration,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        let defaults = Self::default();
        Self {
            listen_addr: raw
                .listen_addr
                .and_then(|a| a.parse().ok())
                .unwrap_or(defaults.listen_addr),
            data_dir: raw.data_dir.unwrap_or(defaults.data_dir),
            store_timeout: raw
                .store_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
            heartbeat_retention: raw
                .heartbeat_retention_hours
                .map(|h| Duration::from_secs(h.saturating_mul(3600)))
                .unwrap_or(defaults.heartbeat_retention),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8088)),
            data_dir: default_data_dir(),
            store_timeout: Duration::from_secs(2),
            heartbeat_retention: Duration::from_secs(24 * 3600),
        }
    }
}

/// Heartbeat timing contract and anti-abuse thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingParams {
    /// Expected heartbeat cadence; also the credit for the first heartbeat of a session
    pub heartbeat_interval: Duration,
    /// Heartbeats closer together than this are rejected as too frequent
    pub min_interval: Duration,
    /// Upper bound on the time credited by one heartbeat
    pub max_increment: Duration,
    /// Sessions running longer than this are rotated
    pub max_session: Duration,
    /// Open sessions allowed per learner across all subsections
    pub max_parallel_sessions: usize,
    /// An open session only counts as concurrent if it saw activity this recently
    pub session_activity_window: Duration,
    /// Half-width of the "too exact" band around the heartbeat interval, in seconds
    pub regularity_band_secs: f64,
    /// Consecutive in-band intervals that trigger the regularity rejection
    pub regularity_window: usize,
    /// Accepted heartbeat attempts per (learner, subsection) per minute
    pub rate_limit_per_minute: usize,
    /// Trailing window examined by the bot detector
    pub bot_window: Duration,
    /// Minimum number of intervals before the bot detector decides anything
    pub bot_min_samples: usize,
    /// Interval standard deviation below which a learner is flagged
    pub bot_stddev_threshold: f64,
    /// Lifetime of a verification-required marker
    pub verification_ttl: Duration,
    /// Completion floor for subsections without their own
    pub default_min_time_seconds: u32,
}

impl TrackingParams {
    fn from_raw(raw: &RawTrackingConfig) -> Self {
        let d = Self::default();
        let secs = |v: Option<u64>, default: Duration| v.map(Duration::from_secs).unwrap_or(default);

        Self {
            heartbeat_interval: secs(raw.heartbeat_interval_seconds, d.heartbeat_interval),
            min_interval: secs(raw.min_interval_seconds, d.min_interval),
            max_increment: secs(raw.max_increment_seconds, d.max_increment),
            max_session: secs(raw.max_session_seconds, d.max_session),
            max_parallel_sessions: raw.max_parallel_sessions.unwrap_or(d.max_parallel_sessions),
            session_activity_window: secs(
                raw.session_activity_window_seconds,
                d.session_activity_window,
            ),
            regularity_band_secs: raw.regularity_band_seconds.unwrap_or(d.regularity_band_secs),
            regularity_window: raw.regularity_window.unwrap_or(d.regularity_window),
            rate_limit_per_minute: raw.rate_limit_per_minute.unwrap_or(d.rate_limit_per_minute),
            bot_window: secs(raw.bot_window_seconds, d.bot_window),
            bot_min_samples: raw.bot_min_samples.unwrap_or(d.bot_min_samples),
            bot_stddev_threshold: raw.bot_stddev_threshold.unwrap_or(d.bot_stddev_threshold),
            verification_ttl: secs(raw.verification_ttl_seconds, d.verification_ttl),
            default_min_time_seconds: raw
                .default_min_time_seconds
                .unwrap_or(d.default_min_time_seconds),
        }
    }
}

impl Default for TrackingParams {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(15),
            min_interval: Duration::from_secs(10),
            max_increment: Duration::from_secs(60),
            max_session: Duration::from_secs(2 * 3600),
            max_parallel_sessions: 3,
            session_activity_window: Duration::from_secs(5 * 60),
            regularity_band_secs: 0.1,
            regularity_window: 5,
            rate_limit_per_minute: 4,
            bot_window: Duration::from_secs(3600),
            bot_min_samples: 10,
            bot_stddev_threshold: 1.0,
            verification_ttl: Duration::from_secs(3600),
            default_min_time_seconds: 30,
        }
    }
}

/// Completion thresholds for one subsection (read-only, owned by content authoring)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsectionPolicy {
    pub subsection_id: SubsectionId,
    /// Recommended time to spend, in minutes
    pub required_time_minutes: Option<u32>,
    /// Floor below which completion is 0% when no recommended time exists
    pub min_time_seconds: u32,
}

impl SubsectionPolicy {
    fn from_raw(raw: RawSubsection, default_min_time_seconds: u32) -> Self {
        Self {
            subsection_id: SubsectionId::new(raw.id),
            required_time_minutes: raw.required_time_minutes,
            min_time_seconds: raw.min_time_seconds.unwrap_or(default_min_time_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_defaults_match_heartbeat_contract() {
        let params = TrackingParams::default();
        assert_eq!(params.heartbeat_interval, Duration::from_secs(15));
        assert_eq!(params.min_interval, Duration::from_secs(10));
        assert_eq!(params.max_increment, Duration::from_secs(60));
        assert_eq!(params.max_session, Duration::from_secs(7200));
        assert_eq!(params.rate_limit_per_minute, 4);
        assert_eq!(params.default_min_time_seconds, 30);
    }

    #[test]
    fn subsection_inherits_default_floor() {
        let raw = RawSubsection {
            id: 9,
            required_time_minutes: None,
            min_time_seconds: None,
        };

        let policy = SubsectionPolicy::from_raw(raw, 45);
        assert_eq!(policy.subsection_id, SubsectionId::new(9));
        assert_eq!(policy.min_time_seconds, 45);
    }

    #[test]
    fn service_defaults() {
        let service = ServiceConfig::from_raw(RawServiceConfig::default());
        assert_eq!(service.listen_addr.to_string(), "127.0.0.1:8088");
        assert_eq!(service.store_timeout, Duration::from_secs(2));
    }
}
