//! Backoff policy
//!
//! A pure table from a failed attempt to the next step of the retry loop.
//! The controller performs the sleeps; nothing here touches IO.

use rand::Rng;
use std::time::Duration;

/// Why a single fetch attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// DNS failure, refused connection or a hard-error URL during a content wait
    Navigation,
    /// The page never settled, even after the in-place content wait
    Timeout,
    /// The session landed on an error page
    HardError,
    /// Navigation left the target domain
    OffDomain,
    /// A challenge interstitial did not clear in time
    ChallengePending,
    /// The site served a thin placeholder instead of the product
    Blocked,
    /// The driver session is gone
    Unrecoverable,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Navigation => "navigation",
            FailureKind::Timeout => "timeout",
            FailureKind::HardError => "hard_error",
            FailureKind::OffDomain => "off_domain",
            FailureKind::ChallengePending => "challenge_pending",
            FailureKind::Blocked => "blocked",
            FailureKind::Unrecoverable => "unrecoverable",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range of seconds a wait is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl DelayRange {
    pub const fn secs(min_secs: u64, max_secs: u64) -> Self {
        Self { min_secs, max_secs }
    }

    /// Draws a uniformly distributed duration with millisecond resolution
    pub fn sample(&self) -> Duration {
        let lo = self.min_secs.min(self.max_secs) * 1000;
        let hi = self.min_secs.max(self.max_secs) * 1000;
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }

    pub fn contains(&self, delay: Duration) -> bool {
        let ms = delay.as_millis();
        ms >= u128::from(self.min_secs) * 1000 && ms <= u128::from(self.max_secs) * 1000
    }
}

/// What the retry loop does after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry {
        /// Backoff before the next navigation
        delay: DelayRange,
        /// Extra anti-rate-limit wait after repeated blocks
        cooldown: Option<DelayRange>,
        /// Whether to issue a pacing scroll before the next navigation
        pace: bool,
    },
    Fatal,
}

const TRANSIENT: DelayRange = DelayRange::secs(5, 8);
const PAGE_LEVEL: DelayRange = DelayRange::secs(10, 15);
const BLOCKED_COOLDOWN: DelayRange = DelayRange::secs(10, 20);

/// Decides the next step after attempt number `attempt` (1-based) failed
///
/// `blocked_outcomes` counts Blocked failures so far for this URL, including
/// this one.
///
/// | Failure | Wait (s) |
/// |---------|----------|
/// | Navigation, Timeout | 5-8 |
/// | HardError, OffDomain, ChallengePending | 10-15 |
/// | Blocked | (30 + 10n)-(45 + 10n), n = failed attempts |
/// | Unrecoverable | fatal |
///
/// From the second Blocked outcome on, an extra 10-20s cooldown and a
/// pacing scroll precede the next attempt.
pub fn decide(
    failure: FailureKind,
    attempt: u32,
    max_attempts: u32,
    blocked_outcomes: u32,
) -> RetryDecision {
    if failure == FailureKind::Unrecoverable || attempt >= max_attempts {
        return RetryDecision::Fatal;
    }

    let delay = match failure {
        FailureKind::Navigation | FailureKind::Timeout => TRANSIENT,
        FailureKind::HardError | FailureKind::OffDomain | FailureKind::ChallengePending => {
            PAGE_LEVEL
        }
        FailureKind::Blocked => {
            let n = u64::from(attempt);
            DelayRange::secs(30 + 10 * n, 45 + 10 * n)
        }
        FailureKind::Unrecoverable => return RetryDecision::Fatal,
    };

    let repeated_block = failure == FailureKind::Blocked && blocked_outcomes >= 2;
    RetryDecision::Retry {
        delay,
        cooldown: repeated_block.then_some(BLOCKED_COOLDOWN),
        pace: repeated_block,
    }
}
