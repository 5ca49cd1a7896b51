// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Lockout of accounts after repeated failed logins.

use crate::metrics;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default number of failed attempts before lockout
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default lockout duration (5 minutes)
const DEFAULT_LOCKOUT_DURATION: Duration = Duration::from_secs(5 * 60);

/// Failed attempts are forgotten after this long without a new one
const RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct AttemptEntry {
    failed_attempts: u32,
    last_failure: Instant,
    lockout_expiry: Option<Instant>,
}

/// Tracks failed logins per normalized email
#[derive(Debug, Clone)]
pub struct AuthRateLimiter {
    attempts: Arc<DashMap<String, AttemptEntry>>,
    max_attempts: u32,
    lockout_duration: Duration,
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_LOCKOUT_DURATION)
    }
}

impl AuthRateLimiter {
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            lockout_duration,
        }
    }

    /// Record a failed login for `email`
    pub fn record_failed_attempt(&self, email: &str) {
        let now = Instant::now();

        let mut entry = self
            .attempts
            .entry(email.to_owned())
            .or_insert_with(|| AttemptEntry {
                failed_attempts: 0,
                last_failure: now,
                lockout_expiry: None,
            });

        if entry.lockout_expiry.is_some_and(|expiry| now > expiry) {
            entry.failed_attempts = 0;
            entry.lockout_expiry = None;
        }

        entry.failed_attempts += 1;
        entry.last_failure = now;

        if entry.failed_attempts >= self.max_attempts && entry.lockout_expiry.is_none() {
            entry.lockout_expiry = Some(now + self.lockout_duration);
            ::metrics::counter!(metrics::AUTH_LOCKOUT).increment(1);
            tracing::warn!(
                email,
                lockout_secs = self.lockout_duration.as_secs(),
                "account locked after repeated failed logins"
            );
        }
    }

    /// A successful login clears the history
    pub fn record_success(&self, email: &str) {
        self.attempts.remove(email);
    }

    /// Whether `email` may attempt to log in right now
    pub fn check_rate_limit(&self, email: &str) -> bool {
        match self.attempts.get(email) {
            Some(entry) => entry
                .lockout_expiry
                .is_none_or(|expiry| Instant::now() >= expiry),
            None => true,
        }
    }

    /// Drop expired lockouts and stale failure counts
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.attempts.retain(|_, entry| match entry.lockout_expiry {
            Some(expiry) => now < expiry,
            None => now.duration_since(entry.last_failure) < RETENTION,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lockout_after_max_attempts() {
        let limiter = AuthRateLimiter::new(3, Duration::from_secs(60));
        let email = "keeper@example.com";

        limiter.record_failed_attempt(email);
        limiter.record_failed_attempt(email);
        assert!(limiter.check_rate_limit(email));

        limiter.record_failed_attempt(email);
        assert!(!limiter.check_rate_limit(email));

        // other accounts are unaffected
        assert!(limiter.check_rate_limit("striker@example.com"));
    }

    #[test]
    fn test_success_resets_history() {
        let limiter = AuthRateLimiter::new(2, Duration::from_secs(60));
        let email = "keeper@example.com";

        limiter.record_failed_attempt(email);
        limiter.record_success(email);
        limiter.record_failed_attempt(email);
        assert!(limiter.check_rate_limit(email));
    }

    #[test]
    fn test_lockout_expires() {
        let limiter = AuthRateLimiter::new(1, Duration::ZERO);
        let email = "keeper@example.com";

        limiter.record_failed_attempt(email);
        assert!(limiter.check_rate_limit(email));

        limiter.cleanup();
        assert!(limiter.attempts.is_empty());
    }
}
