//! Resilient page acquisition
//!
//! [`FetchController`] drives a [`PageDriver`](crate::driver::PageDriver)
//! through navigate, settle, classify, readiness and validation steps,
//! retrying with the backoff table in [`policy`] until a page is usable or
//! the attempt budget runs out. Transient failures never leave this module;
//! callers only see a [`RenderedPage`] or a [`FetchError`].

pub mod classifier;
pub mod controller;
pub mod health;
pub mod policy;
pub mod readiness;

pub use classifier::{AntiBotClassifier, PageClass};
pub use controller::{FetchAttempt, FetchController};
pub use health::{consecutive_failure_limit, HealthPredicate, HealthSnapshot, HealthState};
pub use policy::{decide, DelayRange, FailureKind, RetryDecision};
pub use readiness::{content_ready, PageReadinessProbe, ReadinessReport};

use thiserror::Error;

/// A fully loaded page that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// The URL that was requested
    pub url: String,
    /// Where the session ended up after redirects
    pub final_url: String,
    pub markup: String,
    /// Title as resolved when the page was validated
    pub title: String,
}

/// Terminal fetch outcomes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Giving up on {url}: {reason}")]
    Fatal { url: String, reason: String },

    #[error("Circuit open, skipped {url}")]
    CircuitOpen { url: String },
}
