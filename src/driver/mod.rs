//! Rendering capability used to load product and listing pages
//!
//! The fetch layer never talks to a browser or HTTP client directly; it
//! drives a [`PageDriver`], which can navigate, report where it ended up,
//! hand back the current markup and run scroll/measure actions.
//!
//! Navigation-level failures are reported through [`DriverError`] and kept
//! distinct from content-level problems (challenge pages, blocked pages),
//! which the driver cannot know about and which the classifier decides on.

mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use http::{build_http_client, HttpDriver};

use thiserror::Error;

/// Navigation-level failures of the rendering capability
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    /// The page did not finish loading within the navigation timeout
    #[error("navigation timed out: {0}")]
    Timeout(String),

    /// DNS failure, refused connection or a hard browser error
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The session itself is gone; retrying on it is pointless
    #[error("driver unrecoverable: {0}")]
    Unrecoverable(String),
}

/// Scroll and probe actions a driver can execute on the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    /// Scroll to the bottom of the document
    ScrollToBottom,

    /// Scroll vertically by a pixel offset (negative scrolls up)
    ScrollBy(i64),

    /// Measure the document height without scrolling
    MeasureHeight,
}

/// The rendering capability
///
/// Every action returns the document height after it ran, which is what the
/// readiness probe compares across scrolls. Implementations are used by one
/// session at a time.
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    /// Loads `url`, following redirects
    ///
    /// On [`DriverError::Timeout`] the driver keeps whatever it managed to
    /// load, so callers may still poll the current markup.
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// The URL the session is currently on
    async fn current_url(&mut self) -> Result<String, DriverError>;

    /// The full current markup
    async fn page_source(&mut self) -> Result<String, DriverError>;

    /// Runs a scroll or probe action and reports the document height
    async fn execute(&mut self, action: PageAction) -> Result<u64, DriverError>;
}
