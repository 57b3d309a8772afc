//! Per-record mutual exclusion

use dwell_util::ProgressKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::warn;

use crate::TrackingError;

/// One async lock per progress record, created on demand.
///
/// Operations on the same key are serialized; different keys never contend.
pub struct KeyedLocks {
    locks: Mutex<HashMap<ProgressKey, Arc<AsyncMutex<()>>>>,
    timeout: Duration,
}

impl KeyedLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Wait for exclusive access to `key`, giving up after the configured timeout
    pub async fn acquire(&self, key: ProgressKey) -> Result<OwnedMutexGuard<()>, TrackingError> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(key).or_default())
        };

        match tokio::time::timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                warn!(key = %key, timeout_ms = self.timeout.as_millis() as u64, "Record lock timed out");
                Err(TrackingError::StoreUnavailable(format!(
                    "timed out waiting for record {key}"
                )))
            }
        }
    }

    /// Drop locks nobody holds or waits on; returns how many were removed
    pub fn prune_idle(&self) -> usize {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
