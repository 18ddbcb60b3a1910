//! Per-identity admission gate with a fixed cooldown window.
//!
//! One `last_admitted_at` per identity, held in memory only: a process
//! restart clears every cooldown.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::types::Timestamp;

/// Cooldown used when none is configured (one request every 5 seconds).
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Admission gate keyed by requester identity.
///
/// The check and the update of `last_admitted_at` happen under one lock, so
/// two concurrent calls for the same identity can never both be admitted
/// inside one window.
#[derive(Debug)]
pub struct RateLimiter {
    cooldown: chrono::Duration,
    last_admitted: Mutex<HashMap<String, Timestamp>>,
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown: chrono::Duration::from_std(cooldown).unwrap_or(chrono::Duration::MAX),
            last_admitted: Mutex::new(HashMap::new()),
        }
    }

    /// Admit `identity` at `now` if it has no record or its cooldown has
    /// elapsed. Admission overwrites the record with `now`.
    pub fn admit(&self, identity: &str, now: Timestamp) -> bool {
        let mut records = self.records();
        match records.get(identity) {
            Some(last) if now - *last < self.cooldown => false,
            _ => {
                records.insert(identity.to_string(), now);
                true
            }
        }
    }

    /// Undo the admission of `identity` made at `admitted_at`, for a request
    /// that was admitted but then could not be recorded.
    ///
    /// A newer admission for the same identity is left alone. Returns whether
    /// a record was removed.
    pub fn revoke(&self, identity: &str, admitted_at: Timestamp) -> bool {
        let mut records = self.records();
        if records.get(identity) == Some(&admitted_at) {
            records.remove(identity);
            true
        } else {
            false
        }
    }

    /// Drop records whose cooldown has fully elapsed at `now`.
    ///
    /// Purely a memory bound: an evicted identity would be admitted anyway.
    /// Returns the number of records removed.
    pub fn forget_expired(&self, now: Timestamp) -> usize {
        let mut records = self.records();
        let before = records.len();
        records.retain(|_, last| now - *last < self.cooldown);
        before - records.len()
    }

    /// Number of identities currently tracked.
    pub fn tracked(&self) -> usize {
        self.records().len()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, Timestamp>> {
        // The map holds plain timestamps; a panic mid-insert cannot leave it
        // inconsistent, so a poisoned lock is still usable.
        self.last_admitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn first_request_is_admitted() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        assert!(limiter.admit("u1", at(0)));
    }

    #[test]
    fn second_request_inside_window_is_denied() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        assert!(limiter.admit("u1", at(0)));
        assert!(!limiter.admit("u1", at(2)));
    }

    #[test]
    fn request_exactly_at_cooldown_is_admitted() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        assert!(limiter.admit("u1", at(0)));
        assert!(limiter.admit("u1", at(3)));
    }

    #[test]
    fn denied_request_does_not_extend_the_window() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        assert!(limiter.admit("u1", at(0)));
        assert!(!limiter.admit("u1", at(2)));
        // Window still counts from t=0, not from the denied attempt.
        assert!(limiter.admit("u1", at(3)));
    }

    #[test]
    fn identities_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        assert!(limiter.admit("u1", at(0)));
        assert!(limiter.admit("u2", at(1)));
        assert!(!limiter.admit("u1", at(1)));
    }

    #[test]
    fn revoked_admission_frees_the_window() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        assert!(limiter.admit("u1", at(0)));
        assert!(limiter.revoke("u1", at(0)));
        assert!(limiter.admit("u1", at(1)));
    }

    #[test]
    fn revoke_leaves_a_newer_admission_in_place() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        assert!(limiter.admit("u1", at(0)));
        assert!(limiter.admit("u1", at(5)));

        assert!(!limiter.revoke("u1", at(0)));
        assert!(!limiter.revoke("nobody", at(0)));
        assert!(!limiter.admit("u1", at(6)));
    }

    #[test]
    fn forget_expired_keeps_active_records() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        limiter.admit("old", at(0));
        limiter.admit("fresh", at(5));

        assert_eq!(limiter.forget_expired(at(6)), 1);
        assert_eq!(limiter.tracked(), 1);
        assert!(!limiter.admit("fresh", at(6)));
    }

    #[test]
    fn concurrent_admits_for_one_identity_admit_exactly_once() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(60)));
        let now = at(0);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.admit("same", now))
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
    }
}
