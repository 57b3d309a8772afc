//! Rate limiting utilities

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::Duration;

use crate::time::{time_after, time_before};

/// Sliding-window rate limiter
///
/// Keeps the timestamps of accepted attempts per key and allows a new one
/// only while fewer than `max_requests` fall inside the trailing window.
/// Rejected attempts are not recorded.
#[derive(Debug)]
pub struct RateLimiter<K> {
    /// Maximum accepted attempts per window
    max_requests: usize,
    /// Length of the trailing window
    window: Duration,
    /// Per-key accepted attempt times, oldest first
    keys: HashMap<K, VecDeque<DateTime<Utc>>>,
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateDecision {
    Allowed,
    /// Denied; the oldest attempt leaves the window after this many seconds
    Limited { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

impl<K: Eq + Hash + Clone> RateLimiter<K> {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `max_requests` - Maximum requests allowed per window
    /// * `window` - Length of the trailing window
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            keys: HashMap::new(),
        }
    }

    /// Check if an attempt at `now` should be allowed for the given key,
    /// recording it when it is
    pub fn check(&mut self, key: &K, now: DateTime<Utc>) -> RateDecision {
        let cutoff = time_before(now, self.window);
        let attempts = self.keys.entry(key.clone()).or_default();

        while attempts.front().is_some_and(|t| *t <= cutoff) {
            attempts.pop_front();
        }

        if attempts.len() >= self.max_requests {
            let retry_after_secs = attempts
                .front()
                .map(|oldest| {
                    let frees_at = time_after(*oldest, self.window);
                    (frees_at - now).num_milliseconds().max(0) as u64
                })
                .map(|ms| ms.div_ceil(1000))
                .unwrap_or(0);
            return RateDecision::Limited { retry_after_secs };
        }

        attempts.push_back(now);
        RateDecision::Allowed
    }

    /// Remove a key's rate limit state
    pub fn remove(&mut self, key: &K) {
        self.keys.remove(key);
    }

    /// Drop keys with no attempt inside the window ending at `now`
    pub fn cleanup(&mut self, now: DateTime<Utc>) {
        let cutoff = time_before(now, self.window);
        self.keys
            .retain(|_, attempts| attempts.back().is_some_and(|t| *t > cutoff));
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.keys.len()
    }
}
