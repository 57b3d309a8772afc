//! Session tracker: start / heartbeat / complete

use chrono::{DateTime, Utc};
use dwell_api::{
    HeartbeatResponse, ProgressStatus, ProgressView, SessionEntry, StartResponse, StudySummary,
};
use dwell_config::{SubsectionPolicy, TrackingConfig, TrackingParams};
use dwell_store::{AuditEvent, AuditEventType, HeartbeatSample, ProgressRecord, Store};
use dwell_util::{ProgressKey, RateDecision, RateLimiter, SessionId, SubsectionId, UserId};
use dwell_util::{seconds_between, time_after, time_before};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    Acceptance, ActivityValidator, AuditCascade, BotAssessment, BotDetector, CompletionCascade,
    ConfigPolicyProvider, HeartbeatInput, KeyedLocks, PolicyProvider, StoreVerificationGate,
    TrackingError, VerificationGate, completion_percentage,
};

/// What a maintenance pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub heartbeats_pruned: usize,
    pub idle_locks_pruned: usize,
}

/// Owns every mutation of progress records.
///
/// All read-modify-write sequences on one (learner, subsection) record run
/// under that record's lock; the store is the source of truth between calls.
pub struct SessionTracker {
    params: TrackingParams,
    store: Arc<dyn Store>,
    policies: Arc<dyn PolicyProvider>,
    cascade: Arc<dyn CompletionCascade>,
    gate: Arc<dyn VerificationGate>,
    validator: ActivityValidator,
    bot_detector: BotDetector,
    rate_limiter: Mutex<RateLimiter<ProgressKey>>,
    locks: KeyedLocks,
}

impl SessionTracker {
    /// Tracker backed by the configured policies, the audit cascade and
    /// store-held verification markers
    pub fn new(config: &TrackingConfig, store: Arc<dyn Store>) -> Self {
        let params = config.tracking.clone();

        info!(
            subsections = config.subsections.len(),
            heartbeat_interval_secs = params.heartbeat_interval.as_secs(),
            "Session tracker initialized"
        );

        Self {
            validator: ActivityValidator::new(&params),
            bot_detector: BotDetector::new(&params),
            rate_limiter: Mutex::new(RateLimiter::new(
                params.rate_limit_per_minute,
                Duration::from_secs(60),
            )),
            locks: KeyedLocks::new(config.service.store_timeout),
            policies: Arc::new(ConfigPolicyProvider::new(config)),
            cascade: Arc::new(AuditCascade::new(store.clone())),
            gate: Arc::new(StoreVerificationGate::new(store.clone())),
            store,
            params,
        }
    }

    pub fn with_policy_provider(mut self, policies: Arc<dyn PolicyProvider>) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_completion_cascade(mut self, cascade: Arc<dyn CompletionCascade>) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn with_verification_gate(mut self, gate: Arc<dyn VerificationGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn is_store_healthy(&self) -> bool {
        self.store.is_healthy()
    }

    /// Open a viewing session, closing any session left open before it
    pub async fn start(
        &self,
        user_id: UserId,
        subsection_id: SubsectionId,
        now: DateTime<Utc>,
    ) -> Result<StartResponse, TrackingError> {
        self.policy(subsection_id)?;

        let key = ProgressKey::new(user_id, subsection_id);
        let _guard = self.locks.acquire(key).await?;

        let mut record = self
            .store
            .get_progress(&key)?
            .unwrap_or_else(|| ProgressRecord::new(key, now));

        if let Some(started) = record.session_start_at {
            let max = self.params.max_session.as_secs_f64();
            let duration_seconds = seconds_between(started, now).clamp(0.0, max) as u64;
            let end = started + chrono::Duration::seconds(duration_seconds as i64);

            record.session_history.push(SessionEntry {
                start: started,
                end,
                duration_seconds,
            });

            warn!(
                key = %key,
                duration_secs = duration_seconds,
                "Closing stale session before opening a new one"
            );
            self.audit(
                AuditEventType::SessionClosed {
                    user_id,
                    subsection_id,
                    session_id: record.session_id.clone(),
                    duration_seconds,
                    stale: true,
                },
                now,
            );
        }

        let session_id = SessionId::new();
        record.session_id = Some(session_id.clone());
        record.session_start_at = Some(now);
        record.updated_at = now;
        self.store.save_progress(&record)?;

        info!(
            key = %key,
            session_id = %session_id,
            time_spent_secs = record.time_spent_seconds,
            "Session opened"
        );
        self.audit(
            AuditEventType::SessionOpened {
                user_id,
                subsection_id,
                session_id: session_id.clone(),
            },
            now,
        );

        Ok(StartResponse {
            session_id,
            subsection_id,
            started_at: now,
            time_spent_seconds: record.time_spent_seconds,
            completion_percentage: record.completion_percentage,
            is_completed: record.is_completed,
        })
    }

    /// Credit validated time for one heartbeat.
    ///
    /// Checks run in order: verification gate, rate limiter, open session,
    /// activity validator. A rejection at any step leaves the record unchanged.
    pub async fn heartbeat(
        &self,
        user_id: UserId,
        subsection_id: SubsectionId,
        now: DateTime<Utc>,
    ) -> Result<HeartbeatResponse, TrackingError> {
        let key = ProgressKey::new(user_id, subsection_id);

        if let Some(until) = self.gate.verification_required_until(user_id, now)? {
            warn!(user_id = %user_id, until = %until, "Heartbeat blocked pending verification");
            return Err(TrackingError::VerificationRequired { until });
        }

        let decision = self
            .rate_limiter
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .check(&key, now);
        if let RateDecision::Limited { retry_after_secs } = decision {
            warn!(key = %key, retry_after_secs, "Heartbeat rate limited");
            return Err(TrackingError::RateLimited { retry_after_secs });
        }

        let _guard = self.locks.acquire(key).await?;

        let mut record = self
            .store
            .get_progress(&key)?
            .filter(ProgressRecord::is_session_open)
            .ok_or(TrackingError::SessionNotFound(subsection_id))?;
        let policy = self.policy(subsection_id)?;

        let session_start = record.session_start_at.unwrap_or(now);
        // Activity from an earlier session is not measured against this one
        let interval_secs = record
            .last_activity_at
            .filter(|last| *last >= session_start)
            .map(|last| seconds_between(last, now));
        let recent_intervals = match interval_secs {
            Some(_) => self
                .store
                .recent_intervals(&key, self.validator.history_needed())?,
            None => Vec::new(),
        };
        let active_since = time_before(now, self.params.session_activity_window);
        let open_sessions = self.store.count_open_sessions(user_id, active_since)?;

        let acceptance = self.validator.validate(&HeartbeatInput {
            interval_secs,
            recent_intervals: &recent_intervals,
            open_sessions,
            session_open_for_secs: seconds_between(session_start, now),
        })?;

        if acceptance == Acceptance::AcceptAndRotate {
            let open_for_seconds = seconds_between(session_start, now).max(0.0) as u64;
            warn!(key = %key, open_for_secs = open_for_seconds, "Rotating long-running session");
            record.session_start_at = Some(now);
            self.audit(
                AuditEventType::SessionRotated {
                    user_id,
                    subsection_id,
                    open_for_seconds,
                },
                now,
            );
        }

        let increment = self.increment_for(interval_secs);
        record.time_spent_seconds += increment;
        record.last_activity_at = Some(now);
        record.updated_at = now;

        let newly_completed = self.apply_completion(&mut record, &policy, now);

        self.store.commit_heartbeat(
            &record,
            &HeartbeatSample {
                key,
                at: now,
                interval_secs,
            },
        )?;

        debug!(
            key = %key,
            increment_secs = increment,
            time_spent_secs = record.time_spent_seconds,
            completion = record.completion_percentage,
            "Heartbeat accepted"
        );

        self.detect_bot(user_id, now);

        if newly_completed {
            self.cascade
                .on_subsection_completed(user_id, subsection_id, record.time_spent_seconds, now);
        }

        Ok(HeartbeatResponse {
            time_spent_seconds: record.time_spent_seconds,
            completion_percentage: record.completion_percentage,
            is_completed: record.is_completed,
            next_heartbeat_in_seconds: self.params.heartbeat_interval.as_secs(),
        })
    }

    /// Close the open session and append it to the history.
    ///
    /// Time spent is not advanced here; only heartbeats credit time.
    pub async fn complete(
        &self,
        user_id: UserId,
        subsection_id: SubsectionId,
        now: DateTime<Utc>,
    ) -> Result<ProgressView, TrackingError> {
        let key = ProgressKey::new(user_id, subsection_id);
        let _guard = self.locks.acquire(key).await?;

        let mut record = self
            .store
            .get_progress(&key)?
            .filter(ProgressRecord::is_session_open)
            .ok_or(TrackingError::SessionNotFound(subsection_id))?;

        let start = record.session_start_at.unwrap_or(now);
        let duration_seconds = seconds_between(start, now).max(0.0) as u64;

        record.session_history.push(SessionEntry {
            start,
            end: now,
            duration_seconds,
        });
        let session_id = record.session_id.take();
        record.session_start_at = None;
        record.updated_at = now;
        self.store.save_progress(&record)?;

        info!(key = %key, duration_secs = duration_seconds, "Session closed");
        self.audit(
            AuditEventType::SessionClosed {
                user_id,
                subsection_id,
                session_id,
                duration_seconds,
                stale: false,
            },
            now,
        );

        Ok(view(&record))
    }

    /// Read-only progress for one subsection
    pub fn status(
        &self,
        user_id: UserId,
        subsection_id: SubsectionId,
    ) -> Result<ProgressStatus, TrackingError> {
        let key = ProgressKey::new(user_id, subsection_id);

        Ok(match self.store.get_progress(&key)? {
            Some(record) => ProgressStatus {
                exists: true,
                time_spent_seconds: record.time_spent_seconds,
                completion_percentage: record.completion_percentage,
                is_completed: record.is_completed,
                is_viewed: record.is_viewed,
                viewed_at: record.viewed_at,
                last_activity_at: record.last_activity_at,
                session_active: record.is_session_open(),
            },
            None => ProgressStatus::default(),
        })
    }

    /// Total validated time across all of a learner's subsections
    pub fn summary(&self, user_id: UserId) -> Result<StudySummary, TrackingError> {
        let records = self.store.list_progress_for_user(user_id)?;

        Ok(StudySummary {
            user_id,
            total_time_spent_seconds: records.iter().map(|r| r.time_spent_seconds).sum(),
            subsections_started: records.len(),
            subsections_completed: records.iter().filter(|r| r.is_completed).count(),
        })
    }

    /// Drop heartbeat samples past `retention` and forget idle limiter and lock state
    pub fn run_maintenance(
        &self,
        now: DateTime<Utc>,
        retention: Duration,
    ) -> Result<MaintenanceReport, TrackingError> {
        self.rate_limiter
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cleanup(now);

        let heartbeats_pruned = self.store.prune_heartbeats(time_before(now, retention))?;
        let idle_locks_pruned = self.locks.prune_idle();

        Ok(MaintenanceReport {
            heartbeats_pruned,
            idle_locks_pruned,
        })
    }

    fn policy(&self, subsection_id: SubsectionId) -> Result<SubsectionPolicy, TrackingError> {
        self.policies
            .subsection_policy(subsection_id)
            .ok_or(TrackingError::SubsectionNotFound(subsection_id))
    }

    /// Seconds credited for a heartbeat `interval_secs` after the previous one.
    /// The first heartbeat of a session earns the nominal interval.
    fn increment_for(&self, interval_secs: Option<f64>) -> u64 {
        match interval_secs {
            Some(interval) => interval
                .clamp(0.0, self.params.max_increment.as_secs_f64())
                .trunc() as u64,
            None => self.params.heartbeat_interval.as_secs(),
        }
    }

    /// Recompute completion; returns true on the first transition to completed
    fn apply_completion(
        &self,
        record: &mut ProgressRecord,
        policy: &SubsectionPolicy,
        now: DateTime<Utc>,
    ) -> bool {
        let percentage = completion_percentage(record.time_spent_seconds, policy);
        record.completion_percentage = record.completion_percentage.max(percentage);

        if record.is_completed || record.completion_percentage < 100.0 {
            return false;
        }

        record.is_completed = true;
        record.completion_percentage = 100.0;
        if !record.is_viewed {
            record.is_viewed = true;
            record.viewed_at = Some(now);
        }
        true
    }

    /// Flag the learner when their recent heartbeat timing is too uniform
    fn detect_bot(&self, user_id: UserId, now: DateTime<Utc>) {
        let since = time_before(now, self.params.bot_window);
        let intervals = match self.store.user_intervals_since(user_id, since) {
            Ok(intervals) => intervals,
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "Bot check skipped");
                return;
            }
        };

        if let BotAssessment::BotLike {
            stddev_secs,
            samples,
        } = self.bot_detector.assess(&intervals)
        {
            let until = time_after(now, self.params.verification_ttl);
            warn!(
                user_id = %user_id,
                stddev_secs,
                samples,
                until = %until,
                "Heartbeat timing looks automated; requiring verification"
            );

            if let Err(e) = self.gate.set_verification_required(user_id, until) {
                warn!(error = %e, user_id = %user_id, "Failed to set verification marker");
                return;
            }
            self.audit(
                AuditEventType::BotFlagged {
                    user_id,
                    stddev_seconds: stddev_secs,
                    samples,
                    until,
                },
                now,
            );
        }
    }

    fn audit(&self, event: AuditEventType, now: DateTime<Utc>) {
        if let Err(e) = self.store.append_audit(AuditEvent::new(event, now)) {
            warn!(error = %e, "Failed to append audit event");
        }
    }
}

fn view(record: &ProgressRecord) -> ProgressView {
    ProgressView {
        user_id: record.key.user_id,
        subsection_id: record.key.subsection_id,
        time_spent_seconds: record.time_spent_seconds,
        completion_percentage: record.completion_percentage,
        is_completed: record.is_completed,
        is_viewed: record.is_viewed,
        viewed_at: record.viewed_at,
        last_activity_at: record.last_activity_at,
        session_start_at: record.session_start_at,
        session_history: record.session_history.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dwell_config::parse_config;
    use dwell_store::SqliteStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingCascade {
        calls: AtomicUsize,
    }

    impl CompletionCascade for CountingCascade {
        fn on_subsection_completed(&self, _: UserId, _: SubsectionId, _: u64, _: DateTime<Utc>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    const USER: UserId = UserId::new(1);
    const FLOOR: SubsectionId = SubsectionId::new(10);
    const TIMED: SubsectionId = SubsectionId::new(20);

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn at(secs: f64) -> DateTime<Utc> {
        t0() + dwell_util::duration_from_secs_f64(secs)
    }

    fn make_tracker() -> (SessionTracker, Arc<CountingCascade>) {
        let config = parse_config(
            r#"
            config_version = 1

            [[subsections]]
            id = 10
            min_time_seconds = 30

            [[subsections]]
            id = 20
            required_time_minutes = 5
        "#,
        )
        .unwrap();

        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().unwrap());
        let cascade = Arc::new(CountingCascade::default());
        let tracker = SessionTracker::new(&config, store).with_completion_cascade(cascade.clone());
        (tracker, cascade)
    }

    #[tokio::test]
    async fn test_start_creates_record_lazily() {
        let (tracker, _) = make_tracker();
        assert!(!tracker.status(USER, FLOOR).unwrap().exists);

        let started = tracker.start(USER, FLOOR, t0()).await.unwrap();
        assert_eq!(started.subsection_id, FLOOR);
        assert_eq!(started.started_at, t0());
        assert_eq!(started.time_spent_seconds, 0);

        let status = tracker.status(USER, FLOOR).unwrap();
        assert!(status.exists);
        assert!(status.session_active);
        assert!(status.last_activity_at.is_none());
    }

    #[tokio::test]
    async fn test_start_unknown_subsection() {
        let (tracker, _) = make_tracker();
        let err = tracker.start(USER, SubsectionId::new(99), t0()).await.unwrap_err();
        assert!(matches!(err, TrackingError::SubsectionNotFound(_)));
    }

    #[tokio::test]
    async fn test_floor_completion_fires_cascade_once() {
        let (tracker, cascade) = make_tracker();
        tracker.start(USER, FLOOR, t0()).await.unwrap();

        let first = tracker.heartbeat(USER, FLOOR, at(15.0)).await.unwrap();
        assert_eq!(first.time_spent_seconds, 15);
        assert_eq!(first.completion_percentage, 50.0);
        assert!(!first.is_completed);
        assert_eq!(first.next_heartbeat_in_seconds, 15);

        let second = tracker.heartbeat(USER, FLOOR, at(30.5)).await.unwrap();
        assert_eq!(second.time_spent_seconds, 30);
        assert_eq!(second.completion_percentage, 100.0);
        assert!(second.is_completed);
        assert_eq!(cascade.calls.load(Ordering::SeqCst), 1);

        let third = tracker.heartbeat(USER, FLOOR, at(47.0)).await.unwrap();
        assert!(third.is_completed);
        assert_eq!(third.time_spent_seconds, 46);
        assert_eq!(cascade.calls.load(Ordering::SeqCst), 1);

        let status = tracker.status(USER, FLOOR).unwrap();
        assert!(status.is_viewed);
        assert_eq!(status.viewed_at, Some(at(30.5)));
    }

    #[tokio::test]
    async fn test_increment_is_clamped_to_max() {
        let (tracker, _) = make_tracker();
        tracker.start(USER, TIMED, t0()).await.unwrap();
        tracker.heartbeat(USER, TIMED, at(15.0)).await.unwrap();

        // A long pause credits at most one max increment
        let hb = tracker.heartbeat(USER, TIMED, at(615.0)).await.unwrap();
        assert_eq!(hb.time_spent_seconds, 75);
        assert_eq!(hb.completion_percentage, 25.0);
    }

    #[tokio::test]
    async fn test_heartbeat_without_session() {
        let (tracker, _) = make_tracker();
        let err = tracker.heartbeat(USER, FLOOR, t0()).await.unwrap_err();
        assert!(matches!(err, TrackingError::SessionNotFound(_)));

        tracker.start(USER, FLOOR, t0()).await.unwrap();
        tracker.complete(USER, FLOOR, at(20.0)).await.unwrap();
        let err = tracker.heartbeat(USER, FLOOR, at(40.0)).await.unwrap_err();
        assert!(matches!(err, TrackingError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_too_frequent_leaves_state_unchanged() {
        let (tracker, _) = make_tracker();
        tracker.start(USER, TIMED, t0()).await.unwrap();
        tracker.heartbeat(USER, TIMED, at(15.0)).await.unwrap();
        let before = tracker.status(USER, TIMED).unwrap();

        let err = tracker.heartbeat(USER, TIMED, at(20.0)).await.unwrap_err();
        assert!(matches!(err, TrackingError::TooFrequent { .. }));

        let after = tracker.status(USER, TIMED).unwrap();
        assert_eq!(after.time_spent_seconds, before.time_spent_seconds);
        assert_eq!(after.last_activity_at, before.last_activity_at);
    }

    #[tokio::test]
    async fn test_rate_limit_before_session_check() {
        let (tracker, _) = make_tracker();

        for i in 0..4 {
            let err = tracker.heartbeat(USER, FLOOR, at(i as f64)).await.unwrap_err();
            assert!(matches!(err, TrackingError::SessionNotFound(_)));
        }

        let err = tracker.heartbeat(USER, FLOOR, at(4.0)).await.unwrap_err();
        assert!(matches!(err, TrackingError::RateLimited { retry_after_secs: 56 }));
    }

    #[tokio::test]
    async fn test_stale_session_closed_on_restart() {
        let (tracker, _) = make_tracker();
        tracker.start(USER, TIMED, t0()).await.unwrap();

        // Three hours later the old session is closed with a capped duration
        tracker.start(USER, TIMED, at(3.0 * 3600.0)).await.unwrap();
        let view = tracker.complete(USER, TIMED, at(3.0 * 3600.0 + 60.0)).await.unwrap();

        assert_eq!(view.session_history.len(), 2);
        assert_eq!(view.session_history[0].duration_seconds, 7200);
        assert_eq!(view.session_history[0].start, t0());
        assert_eq!(view.session_history[1].duration_seconds, 60);
        assert!(view.session_start_at.is_none());
    }

    #[tokio::test]
    async fn test_complete_does_not_credit_time() {
        let (tracker, _) = make_tracker();
        tracker.start(USER, TIMED, t0()).await.unwrap();
        tracker.heartbeat(USER, TIMED, at(15.0)).await.unwrap();

        let view = tracker.complete(USER, TIMED, at(500.0)).await.unwrap();
        assert_eq!(view.time_spent_seconds, 15);
        assert_eq!(view.session_history[0].duration_seconds, 500);

        let err = tracker.complete(USER, TIMED, at(510.0)).await.unwrap_err();
        assert!(matches!(err, TrackingError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_summary_totals() {
        let (tracker, _) = make_tracker();
        tracker.start(USER, FLOOR, t0()).await.unwrap();
        tracker.heartbeat(USER, FLOOR, at(15.0)).await.unwrap();
        tracker.heartbeat(USER, FLOOR, at(31.0)).await.unwrap();
        tracker.start(USER, TIMED, t0()).await.unwrap();
        tracker.heartbeat(USER, TIMED, at(20.0)).await.unwrap();

        let summary = tracker.summary(USER).unwrap();
        assert_eq!(summary.total_time_spent_seconds, 46);
        assert_eq!(summary.subsections_started, 2);
        assert_eq!(summary.subsections_completed, 1);
    }

    #[tokio::test]
    async fn test_maintenance_prunes_old_samples() {
        let (tracker, _) = make_tracker();
        tracker.start(USER, TIMED, t0()).await.unwrap();
        tracker.heartbeat(USER, TIMED, at(15.0)).await.unwrap();

        let report = tracker
            .run_maintenance(at(2.0 * 86_400.0), Duration::from_secs(86_400))
            .unwrap();
        assert_eq!(report.heartbeats_pruned, 1);
        assert_eq!(report.idle_locks_pruned, 1);
    }

    struct FixedPolicy;

    impl PolicyProvider for FixedPolicy {
        fn subsection_policy(&self, subsection_id: SubsectionId) -> Option<SubsectionPolicy> {
            (subsection_id == SubsectionId::new(77)).then_some(SubsectionPolicy {
                subsection_id,
                required_time_minutes: Some(1),
                min_time_seconds: 30,
            })
        }
    }

    struct AlwaysVerify;

    impl VerificationGate for AlwaysVerify {
        fn verification_required_until(
            &self,
            _: UserId,
            now: DateTime<Utc>,
        ) -> Result<Option<DateTime<Utc>>, TrackingError> {
            Ok(Some(now + chrono::Duration::minutes(5)))
        }

        fn set_verification_required(&self, _: UserId, _: DateTime<Utc>) -> Result<(), TrackingError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_custom_policy_provider() {
        let (tracker, _) = make_tracker();
        let tracker = tracker.with_policy_provider(Arc::new(FixedPolicy));
        let custom = SubsectionId::new(77);

        let err = tracker.start(USER, FLOOR, t0()).await.unwrap_err();
        assert!(matches!(err, TrackingError::SubsectionNotFound(_)));

        tracker.start(USER, custom, t0()).await.unwrap();
        let hb = tracker.heartbeat(USER, custom, at(15.0)).await.unwrap();
        assert_eq!(hb.completion_percentage, 25.0);
    }

    #[tokio::test]
    async fn test_verification_gate_blocks_heartbeat() {
        let (tracker, _) = make_tracker();
        let tracker = tracker.with_verification_gate(Arc::new(AlwaysVerify));
        tracker.start(USER, FLOOR, t0()).await.unwrap();

        let err = tracker.heartbeat(USER, FLOOR, at(15.0)).await.unwrap_err();
        assert!(matches!(err, TrackingError::VerificationRequired { .. }));
        assert_eq!(tracker.status(USER, FLOOR).unwrap().time_spent_seconds, 0);
    }
}
