//! Run-wide fetch health and the circuit-breaker predicate

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Failure counters shared by every controller of a run
///
/// Only terminal fetch outcomes are recorded. All operations are atomic, so
/// one instance can be shared across sessions behind an `Arc`.
#[derive(Debug, Default)]
pub struct HealthState {
    consecutive_failures: AtomicU32,
    total: AtomicU64,
    successful: AtomicU64,
    /// Milliseconds since the epoch, 0 when no failure was recorded
    last_failure_at: AtomicI64,
}

/// Point-in-time copy of [`HealthState`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthSnapshot {
    pub consecutive_failures: u32,
    pub total: u64,
    pub successful: u64,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl HealthSnapshot {
    /// Share of successful fetches, 1.0 before any fetch completed
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.successful as f64 / self.total as f64
        }
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        self.successful.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        self.consecutive_failures.fetch_add(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        self.last_failure_at
            .store(Utc::now().timestamp_millis(), Ordering::SeqCst);
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    /// Clears every counter
    pub fn reset(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.total.store(0, Ordering::SeqCst);
        self.successful.store(0, Ordering::SeqCst);
        self.last_failure_at.store(0, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let millis = self.last_failure_at.load(Ordering::SeqCst);
        HealthSnapshot {
            consecutive_failures: self.consecutive_failures.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
            successful: self.successful.load(Ordering::SeqCst),
            last_failure_at: (millis != 0)
                .then(|| Utc.timestamp_millis_opt(millis).single())
                .flatten(),
        }
    }
}

/// Caller-supplied check run before every attempt; `false` opens the circuit
pub type HealthPredicate = Arc<dyn Fn(&HealthSnapshot) -> bool + Send + Sync>;

/// Healthy while consecutive failures stay below `max_consecutive_failures`
pub fn consecutive_failure_limit(max_consecutive_failures: u32) -> HealthPredicate {
    Arc::new(move |snapshot: &HealthSnapshot| {
        snapshot.consecutive_failures < max_consecutive_failures
    })
}
