//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Heartbeat and anti-abuse tuning
    #[serde(default)]
    pub tracking: RawTrackingConfig,

    /// Known subsections and their completion thresholds
    #[serde(default)]
    pub subsections: Vec<RawSubsection>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// HTTP listen address (default: 127.0.0.1:8088)
    pub listen_addr: Option<String>,

    /// Data directory for the store
    pub data_dir: Option<PathBuf>,

    /// Upper bound on waiting for a record lock or the database, in milliseconds
    pub store_timeout_ms: Option<u64>,

    /// How long accepted heartbeat samples are kept, in hours
    pub heartbeat_retention_hours: Option<u64>,
}

/// Heartbeat and anti-abuse tuning. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTrackingConfig {
    pub heartbeat_interval_seconds: Option<u64>,
    pub min_interval_seconds: Option<u64>,
    pub max_increment_seconds: Option<u64>,
    pub max_session_seconds: Option<u64>,
    pub max_parallel_sessions: Option<usize>,
    pub session_activity_window_seconds: Option<u64>,
    pub regularity_band_seconds: Option<f64>,
    pub regularity_window: Option<usize>,
    pub rate_limit_per_minute: Option<usize>,
    pub bot_window_seconds: Option<u64>,
    pub bot_min_samples: Option<usize>,
    pub bot_stddev_threshold: Option<f64>,
    pub verification_ttl_seconds: Option<u64>,
    pub default_min_time_seconds: Option<u32>,
}

/// Raw subsection definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSubsection {
    /// Subsection ID as used in request paths
    pub id: i64,

    /// Recommended time to spend, in minutes
    pub required_time_minutes: Option<u32>,

    /// Completion floor in seconds when no recommended time is set
    pub min_time_seconds: Option<u32>,
}
