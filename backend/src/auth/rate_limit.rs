//! In-memory attempt counter with a sliding window and a lockout.
//!
//! State is process scoped and lost on restart.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Limits for one kind of attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_attempts: u32,
    pub window: Duration,
    pub block_duration: Duration,
}

impl RateLimitConfig {
    /// 5 attempts per 15 minutes, then 30 minutes blocked.
    pub fn login() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::minutes(15),
            block_duration: Duration::minutes(30),
        }
    }

    /// 3 attempts per hour, then 2 hours blocked.
    pub fn signup() -> Self {
        Self {
            max_attempts: 3,
            window: Duration::hours(1),
            block_duration: Duration::hours(2),
        }
    }

    /// 3 attempts per 15 minutes, then 1 hour blocked.
    pub fn password_reset() -> Self {
        Self {
            max_attempts: 3,
            window: Duration::minutes(15),
            block_duration: Duration::hours(1),
        }
    }
}

#[derive(Debug, Clone)]
struct AttemptRecord {
    attempts: u32,
    window_start: DateTime<Utc>,
    blocked_until: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    /// Neither blocked nor inside a window: the record carries no state.
    fn is_expired(&self, config: &RateLimitConfig, now: DateTime<Utc>) -> bool {
        self.blocked_until.is_none_or(|until| now >= until)
            && now - self.window_start >= config.window
    }
}

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<String, AttemptRecord>,
    last_sweep: Option<DateTime<Utc>>,
}

impl Records {
    /// Drop expired records, at most once per window.
    fn sweep(&mut self, config: &RateLimitConfig, now: DateTime<Utc>) {
        if self.last_sweep.is_some_and(|at| now - at < config.window) {
            return;
        }
        let before = self.by_id.len();
        self.by_id.retain(|_, record| !record.is_expired(config, now));
        self.last_sweep = Some(now);
        let dropped = before - self.by_id.len();
        if dropped > 0 {
            log::debug!("Dropped {} expired rate-limit records", dropped);
        }
    }
}

/// Per-identifier rate limiter. Clones share state.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    records: Arc<RwLock<Records>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            records: Arc::new(RwLock::new(Records::default())),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Record an attempt by `id` and report whether it may proceed.
    pub fn check(&self, id: &str) -> bool {
        self.check_at(id, Utc::now())
    }

    /// Record an attempt at `now`.
    ///
    /// Returns `false` while `id` is blocked. An attempt made after
    /// `max_attempts` were used inside the window starts a block and is
    /// refused.
    pub fn check_at(&self, id: &str, now: DateTime<Utc>) -> bool {
        let mut records = self.records.write();
        records.sweep(&self.config, now);
        let record = records.by_id.entry(id.to_string()).or_insert(AttemptRecord {
            attempts: 0,
            window_start: now,
            blocked_until: None,
        });

        if let Some(until) = record.blocked_until {
            if now < until {
                return false;
            }
            record.blocked_until = None;
            record.attempts = 0;
            record.window_start = now;
        }
        if now - record.window_start >= self.config.window {
            record.attempts = 0;
            record.window_start = now;
        }

        if record.attempts >= self.config.max_attempts {
            record.blocked_until = Some(now + self.config.block_duration);
            log::warn!(
                "Rate limit reached for {} ({} attempts)",
                id,
                record.attempts
            );
            return false;
        }
        record.attempts += 1;
        true
    }

    /// Seconds until `id` is unblocked, rounded up; zero when not blocked.
    pub fn remaining_secs(&self, id: &str) -> i64 {
        self.remaining_secs_at(id, Utc::now())
    }

    pub fn remaining_secs_at(&self, id: &str, now: DateTime<Utc>) -> i64 {
        let records = self.records.read();
        let Some(until) = records.by_id.get(id).and_then(|r| r.blocked_until) else {
            return 0;
        };
        let left = until - now;
        if left <= Duration::zero() {
            return 0;
        }
        let millis = left.num_milliseconds();
        (millis + 999) / 1000
    }

    /// Attempts left in the current window.
    pub fn remaining_attempts_at(&self, id: &str, now: DateTime<Utc>) -> u32 {
        let records = self.records.read();
        match records.by_id.get(id) {
            None => self.config.max_attempts,
            Some(r) if r.blocked_until.is_some_and(|until| now < until) => 0,
            Some(r) if now - r.window_start >= self.config.window => self.config.max_attempts,
            Some(r) => self.config.max_attempts.saturating_sub(r.attempts),
        }
    }

    /// Forget every attempt by `id`.
    pub fn reset(&self, id: &str) {
        self.records.write().by_id.remove(id);
    }

    /// Identifiers currently holding attempt state.
    pub fn tracked(&self) -> usize {
        self.records.read().by_id.len()
    }
}

/// Whole minutes for a lockout message, rounded up.
pub fn minutes_from_secs(secs: i64) -> i64 {
    (secs.max(0) + 59) / 60
}
