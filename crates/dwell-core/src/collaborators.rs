//! Seams to the systems around the tracker
//!
//! - [`PolicyProvider`]: completion thresholds per subsection
//! - [`CompletionCascade`]: told once when a learner completes a subsection
//! - [`VerificationGate`]: per-learner "prove you are human" marker

use chrono::{DateTime, Utc};
use dwell_config::{SubsectionPolicy, TrackingConfig};
use dwell_store::{AuditEvent, AuditEventType, Store};
use dwell_util::{SubsectionId, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::TrackingError;

/// Read-only source of subsection completion thresholds
pub trait PolicyProvider: Send + Sync {
    fn subsection_policy(&self, subsection_id: SubsectionId) -> Option<SubsectionPolicy>;
}

/// Policies taken from the `[[subsections]]` table of the configuration
pub struct ConfigPolicyProvider {
    policies: HashMap<SubsectionId, SubsectionPolicy>,
}

impl ConfigPolicyProvider {
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            policies: config
                .subsections
                .iter()
                .map(|p| (p.subsection_id, *p))
                .collect(),
        }
    }
}

impl PolicyProvider for ConfigPolicyProvider {
    fn subsection_policy(&self, subsection_id: SubsectionId) -> Option<SubsectionPolicy> {
        self.policies.get(&subsection_id).copied()
    }
}

/// Receives the completion transition of a (learner, subsection) pair.
///
/// Called exactly once per transition, while the record is still locked.
pub trait CompletionCascade: Send + Sync {
    fn on_subsection_completed(
        &self,
        user_id: UserId,
        subsection_id: SubsectionId,
        time_spent_seconds: u64,
        now: DateTime<Utc>,
    );
}

/// Records completions in the audit log for downstream aggregation
pub struct AuditCascade {
    store: Arc<dyn Store>,
}

impl AuditCascade {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl CompletionCascade for AuditCascade {
    fn on_subsection_completed(
        &self,
        user_id: UserId,
        subsection_id: SubsectionId,
        time_spent_seconds: u64,
        now: DateTime<Utc>,
    ) {
        info!(
            user_id = %user_id,
            subsection_id = %subsection_id,
            time_spent_secs = time_spent_seconds,
            "Subsection completed"
        );

        let event = AuditEvent::new(
            AuditEventType::SubsectionCompleted {
                user_id,
                subsection_id,
                time_spent_seconds,
            },
            now,
        );
        if let Err(e) = self.store.append_audit(event) {
            warn!(error = %e, user_id = %user_id, "Failed to record completion");
        }
    }
}

/// Time-boxed per-learner verification requirement
pub trait VerificationGate: Send + Sync {
    /// Expiry of the requirement if it is still in force at `now`
    fn verification_required_until(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, TrackingError>;

    /// Require verification until `until`
    fn set_verification_required(
        &self,
        user_id: UserId,
        until: DateTime<Utc>,
    ) -> Result<(), TrackingError>;
}

/// Verification markers kept in the store
pub struct StoreVerificationGate {
    store: Arc<dyn Store>,
}

impl StoreVerificationGate {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl VerificationGate for StoreVerificationGate {
    fn verification_required_until(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, TrackingError> {
        match self.store.get_verification_until(user_id)? {
            Some(until) if until > now => Ok(Some(until)),
            Some(_) => {
                self.store.clear_verification(user_id)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set_verification_required(
        &self,
        user_id: UserId,
        until: DateTime<Utc>,
    ) -> Result<(), TrackingError> {
        self.store.set_verification_until(user_id, until)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dwell_config::parse_config;
    use dwell_store::SqliteStore;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn config_provider_looks_up_by_id() {
        let config = parse_config(
            r#"
            config_version = 1

            [[subsections]]
            id = 5
            required_time_minutes = 2
        "#,
        )
        .unwrap();
        let provider = ConfigPolicyProvider::new(&config);

        let policy = provider.subsection_policy(SubsectionId::new(5)).unwrap();
        assert_eq!(policy.required_time_minutes, Some(2));
        assert!(provider.subsection_policy(SubsectionId::new(6)).is_none());
    }

    #[test]
    fn verification_marker_expires() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().unwrap());
        let gate = StoreVerificationGate::new(store.clone());
        let user = UserId::new(1);
        let until = t0() + chrono::Duration::hours(1);

        assert_eq!(gate.verification_required_until(user, t0()).unwrap(), None);

        gate.set_verification_required(user, until).unwrap();
        assert_eq!(
            gate.verification_required_until(user, t0()).unwrap(),
            Some(until)
        );

        // Expired markers are cleared on read
        assert_eq!(gate.verification_required_until(user, until).unwrap(), None);
        assert!(store.get_verification_until(user).unwrap().is_none());
    }

    #[test]
    fn audit_cascade_records_completion() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().unwrap());
        let cascade = AuditCascade::new(store.clone());

        cascade.on_subsection_completed(UserId::new(1), SubsectionId::new(2), 30, t0());

        let events = store.get_recent_audits(1).unwrap();
        assert!(matches!(
            events[0].event,
            AuditEventType::SubsectionCompleted { time_spent_seconds: 30, .. }
        ));
    }
}
