//! Per-heartbeat activity checks

use dwell_config::TrackingParams;
use tracing::warn;

use crate::TrackingError;

/// Facts about one heartbeat, gathered by the tracker before validation
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatInput<'a> {
    /// Seconds since the record's last accepted heartbeat, if it has one
    pub interval_secs: Option<f64>,
    /// Intervals of the preceding accepted heartbeats on this record, newest first
    pub recent_intervals: &'a [Option<f64>],
    /// The learner's open, recently active sessions (this one included)
    pub open_sessions: usize,
    /// Seconds since the open session started
    pub session_open_for_secs: f64,
}

/// Outcome of a heartbeat that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Accept,
    /// Accept, but restart the session clock
    AcceptAndRotate,
}

/// Stateless checks run against every heartbeat, in order:
/// minimum spacing, regularity, concurrent-session cap, continuous-duration cap.
/// Only the last one can accept; the first three reject without side effects.
#[derive(Debug, Clone)]
pub struct ActivityValidator {
    expected_interval_secs: f64,
    min_interval_secs: u64,
    band_secs: f64,
    regularity_window: usize,
    max_parallel_sessions: usize,
    max_session_secs: f64,
}

impl ActivityValidator {
    pub fn new(params: &TrackingParams) -> Self {
        Self {
            expected_interval_secs: params.heartbeat_interval.as_secs_f64(),
            min_interval_secs: params.min_interval.as_secs(),
            band_secs: params.regularity_band_secs,
            regularity_window: params.regularity_window,
            max_parallel_sessions: params.max_parallel_sessions,
            max_session_secs: params.max_session.as_secs_f64(),
        }
    }

    /// How many past intervals the regularity check needs to see
    pub fn history_needed(&self) -> usize {
        self.regularity_window.saturating_sub(1)
    }

    pub fn validate(&self, input: &HeartbeatInput<'_>) -> Result<Acceptance, TrackingError> {
        if let Some(interval) = input.interval_secs {
            if interval < self.min_interval_secs as f64 {
                warn!(interval_secs = interval, "Heartbeat too frequent");
                return Err(TrackingError::TooFrequent {
                    elapsed_secs: interval,
                    min_secs: self.min_interval_secs,
                });
            }

            if self.is_regular_run(interval, input.recent_intervals) {
                warn!(interval_secs = interval, "Heartbeat timing too regular");
                return Err(TrackingError::SuspiciousRegularity {
                    interval_secs: interval,
                    window: self.regularity_window,
                });
            }
        }

        if input.open_sessions > self.max_parallel_sessions {
            warn!(active = input.open_sessions, "Too many active sessions");
            return Err(TrackingError::TooManyActiveSessions {
                active: input.open_sessions,
                max: self.max_parallel_sessions,
            });
        }

        if input.session_open_for_secs > self.max_session_secs {
            return Ok(Acceptance::AcceptAndRotate);
        }

        Ok(Acceptance::Accept)
    }

    fn in_band(&self, interval: f64) -> bool {
        (interval - self.expected_interval_secs).abs() <= self.band_secs
    }

    /// The current interval closes a run of `regularity_window` consecutive in-band intervals
    fn is_regular_run(&self, interval: f64, recent: &[Option<f64>]) -> bool {
        let needed = self.history_needed();
        if !self.in_band(interval) || recent.len() < needed {
            return false;
        }

        recent
            .iter()
            .take(needed)
            .all(|past| past.is_some_and(|i| self.in_band(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ActivityValidator {
        ActivityValidator::new(&TrackingParams::default())
    }

    fn input(interval: Option<f64>, recent: &[Option<f64>]) -> HeartbeatInput<'_> {
        HeartbeatInput {
            interval_secs: interval,
            recent_intervals: recent,
            open_sessions: 1,
            session_open_for_secs: 60.0,
        }
    }

    #[test]
    fn first_heartbeat_skips_interval_checks() {
        let v = validator();
        assert_eq!(v.validate(&input(None, &[])).unwrap(), Acceptance::Accept);
    }

    #[test]
    fn rejects_short_spacing() {
        let v = validator();
        let err = v.validate(&input(Some(9.99), &[])).unwrap_err();
        assert!(matches!(err, TrackingError::TooFrequent { min_secs: 10, .. }));

        assert!(v.validate(&input(Some(10.0), &[])).is_ok());
    }

    #[test]
    fn regularity_needs_a_full_window() {
        let v = validator();
        assert_eq!(v.history_needed(), 4);

        let three = [Some(15.0), Some(15.05), Some(14.95)];
        assert!(v.validate(&input(Some(15.0), &three)).is_ok());

        let four = [Some(15.0), Some(15.05), Some(14.95), Some(15.1)];
        let err = v.validate(&input(Some(15.0), &four)).unwrap_err();
        assert!(matches!(err, TrackingError::SuspiciousRegularity { window: 5, .. }));
    }

    #[test]
    fn regularity_run_is_broken_by_gaps_and_jitter() {
        let v = validator();

        // Current interval outside the band
        let four = [Some(15.0); 4];
        assert!(v.validate(&input(Some(15.3), &four)).is_ok());

        // One jittery interval in the window
        let jitter = [Some(15.0), Some(16.2), Some(15.0), Some(15.0)];
        assert!(v.validate(&input(Some(15.0), &jitter)).is_ok());

        // A session restart has no interval
        let restart = [Some(15.0), Some(15.0), None, Some(15.0)];
        assert!(v.validate(&input(Some(15.0), &restart)).is_ok());
    }

    #[test]
    fn concurrent_cap_allows_up_to_max() {
        let v = validator();
        let mut hb = input(Some(20.0), &[]);

        hb.open_sessions = 3;
        assert!(v.validate(&hb).is_ok());

        hb.open_sessions = 4;
        let err = v.validate(&hb).unwrap_err();
        assert!(matches!(err, TrackingError::TooManyActiveSessions { active: 4, max: 3 }));
    }

    #[test]
    fn long_session_is_rotated_not_rejected() {
        let v = validator();
        let mut hb = input(Some(30.0), &[]);

        hb.session_open_for_secs = 7200.0;
        assert_eq!(v.validate(&hb).unwrap(), Acceptance::Accept);

        hb.session_open_for_secs = 7200.5;
        assert_eq!(v.validate(&hb).unwrap(), Acceptance::AcceptAndRotate);
    }
}
