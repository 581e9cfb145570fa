// src/rate_limit.rs
//! # Rate tracker
//! Per-client sliding-window request limiter shared by all requests.
//!
//! Each key maps to the timestamps of its recent requests. A check prunes
//! and appends under one lock, so concurrent callers never lose a recorded
//! timestamp. Stale keys are swept only when the tracked-key count crosses a
//! threshold; memory is bounded approximately, not strictly.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: usize },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    inner: Mutex<HashMap<String, VecDeque<Instant>>>,
    limit: usize,
    window: Duration,
    sweep_threshold: usize,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration, sweep_threshold: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            limit: limit.max(1),
            window,
            sweep_threshold: sweep_threshold.max(1),
        }
    }

    /// `limit` requests per minute.
    pub fn per_minute(limit: usize, sweep_threshold: usize) -> Self {
        Self::new(limit, Duration::from_secs(60), sweep_threshold)
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Record a request for `key` at `now` unless the window is already full.
    /// Rejected requests are not recorded.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut map = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };

        if map.len() > self.sweep_threshold {
            sweep(&mut map, now, self.window);
        }

        let stamps = map.entry(key.to_string()).or_default();
        prune(stamps, now, self.window);

        if stamps.len() >= self.limit {
            let retry_after = stamps
                .front()
                .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
                .unwrap_or(self.window);
            return RateDecision::Limited { retry_after };
        }

        stamps.push_back(now);
        RateDecision::Allowed {
            remaining: self.limit - stamps.len(),
        }
    }

    /// Number of addresses currently tracked.
    pub fn tracked_keys(&self) -> usize {
        match self.inner.lock() {
            Ok(g) => g.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

fn prune(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&t) = stamps.front() {
        if now.saturating_duration_since(t) >= window {
            stamps.pop_front();
        } else {
            break;
        }
    }
}

fn sweep(map: &mut HashMap<String, VecDeque<Instant>>, now: Instant, window: Duration) {
    let before = map.len();
    map.retain(|_, stamps| {
        stamps
            .back()
            .is_some_and(|last| now.saturating_duration_since(*last) < window)
    });
    debug!(before, after = map.len(), "rate tracker swept");
}
