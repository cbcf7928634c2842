//! The fetch state machine
//!
//! One attempt walks Navigate, Settle, Classify, ProbeReadiness and
//! Validate. A failed attempt is turned into a [`FailureKind`], handed to
//! [`decide`] and either retried after a backoff or surfaced as fatal.

use super::classifier::{AntiBotClassifier, PageClass};
use super::health::{consecutive_failure_limit, HealthPredicate, HealthState};
use super::policy::{decide, FailureKind, RetryDecision};
use super::readiness::{content_ready, PageReadinessProbe};
use super::{FetchError, RenderedPage};
use crate::config::{Config, FetchConfig, Thresholds};
use crate::driver::{DriverError, PageAction, PageDriver};
use crate::extract::title::resolve_title;
use crate::extract::ProductPage;
use crate::ConfigError;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Record of one attempt of the most recent fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAttempt {
    /// 1-based attempt number
    pub index: u32,
    /// `None` when the attempt succeeded
    pub failure: Option<FailureKind>,
    /// Total wait before the next attempt, if one followed
    pub backoff: Option<Duration>,
}

#[derive(Debug, Clone)]
struct AttemptFailure {
    kind: FailureKind,
    detail: String,
}

impl AttemptFailure {
    fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl From<DriverError> for AttemptFailure {
    fn from(error: DriverError) -> Self {
        let kind = match &error {
            DriverError::Timeout(_) => FailureKind::Timeout,
            DriverError::Navigation(_) => FailureKind::Navigation,
            DriverError::Unrecoverable(_) => FailureKind::Unrecoverable,
        };
        Self::new(kind, error.to_string())
    }
}

type AttemptResult<T> = Result<T, AttemptFailure>;

/// Fetches pages through a driver until they are verifiably ready
pub struct FetchController<D: PageDriver> {
    driver: D,
    classifier: AntiBotClassifier,
    probe: PageReadinessProbe,
    config: FetchConfig,
    thresholds: Thresholds,
    health: Arc<HealthState>,
    healthy: HealthPredicate,
    history: Vec<FetchAttempt>,
}

impl<D: PageDriver> FetchController<D> {
    /// Creates a controller sharing `health` with the rest of the run
    ///
    /// The default circuit breaker opens once `max-consecutive-failures`
    /// terminal failures happened in a row.
    pub fn new(driver: D, config: &Config, health: Arc<HealthState>) -> Result<Self, ConfigError> {
        Ok(Self {
            driver,
            classifier: AntiBotClassifier::from_config(config)?,
            probe: PageReadinessProbe::new(&config.fetch),
            config: config.fetch.clone(),
            thresholds: config.thresholds.clone(),
            health,
            healthy: consecutive_failure_limit(config.fetch.max_consecutive_failures),
            history: Vec::new(),
        })
    }

    /// Replaces the circuit-breaker predicate
    pub fn with_health_predicate(mut self, predicate: HealthPredicate) -> Self {
        self.healthy = predicate;
        self
    }

    pub fn health(&self) -> &Arc<HealthState> {
        &self.health
    }

    /// Attempts made by the most recent [`fetch`](Self::fetch)
    pub fn history(&self) -> &[FetchAttempt] {
        &self.history
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The driver, for callers that navigate listing pages directly
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Fetches `url` until it is ready or retries are exhausted
    ///
    /// Only terminal outcomes touch [`HealthState`]: success resets the
    /// consecutive-failure count, a fatal result increments it. An open
    /// circuit aborts before navigating and leaves the counters alone.
    pub async fn fetch(&mut self, url: &str) -> Result<RenderedPage, FetchError> {
        self.history.clear();
        let mut attempt = 0;
        let mut blocked_outcomes = 0;

        loop {
            attempt += 1;

            let snapshot = self.health.snapshot();
            if !(self.healthy)(&snapshot) {
                tracing::error!(
                    url,
                    consecutive_failures = snapshot.consecutive_failures,
                    "Health check failed, not attempting fetch"
                );
                return Err(FetchError::CircuitOpen {
                    url: url.to_string(),
                });
            }

            tracing::debug!(url, attempt, "Fetch attempt");

            let failure = match self.attempt(url).await {
                Ok(page) => {
                    self.history.push(FetchAttempt {
                        index: attempt,
                        failure: None,
                        backoff: None,
                    });
                    self.health.record_success();
                    tracing::info!(url, attempt, final_url = %page.final_url, "Page ready");
                    return Ok(page);
                }
                Err(failure) => failure,
            };

            if failure.kind == FailureKind::Blocked {
                blocked_outcomes += 1;
            }

            tracing::warn!(
                url,
                attempt,
                outcome = %failure.kind,
                detail = %failure.detail,
                "Fetch attempt failed"
            );

            match decide(failure.kind, attempt, self.config.max_attempts, blocked_outcomes) {
                RetryDecision::Fatal => {
                    self.history.push(FetchAttempt {
                        index: attempt,
                        failure: Some(failure.kind),
                        backoff: None,
                    });
                    self.health.record_failure();
                    tracing::error!(
                        url,
                        attempts = attempt,
                        consecutive_failures = self.health.consecutive_failures(),
                        "Giving up on page"
                    );
                    return Err(FetchError::Fatal {
                        url: url.to_string(),
                        reason: format!("{} after {} attempts: {}", failure.kind, attempt, failure.detail),
                    });
                }
                RetryDecision::Retry {
                    delay,
                    cooldown,
                    pace,
                } => {
                    let mut wait = delay.sample();
                    if let Some(cooldown) = cooldown {
                        wait += cooldown.sample();
                        tracing::info!(url, blocked_outcomes, "Repeated blocks, cooling down");
                    }
                    self.history.push(FetchAttempt {
                        index: attempt,
                        failure: Some(failure.kind),
                        backoff: Some(wait),
                    });
                    tracing::info!(url, wait_ms = wait.as_millis() as u64, "Backing off");
                    sleep(wait).await;
                    if pace {
                        self.pace().await;
                    }
                }
            }
        }
    }

    async fn attempt(&mut self, url: &str) -> AttemptResult<RenderedPage> {
        // Navigate
        match self.driver.navigate(url).await {
            Ok(()) => {}
            Err(DriverError::Timeout(detail)) => {
                tracing::debug!(url, detail = %detail, "Navigation timed out, waiting for content");
                self.wait_for_content().await?;
            }
            Err(error) => return Err(error.into()),
        }

        // Settle
        let settle = {
            let (lo, hi) = (self.config.settle_min_ms, self.config.settle_max_ms);
            Duration::from_millis(rand::thread_rng().gen_range(lo.min(hi)..=hi.max(lo)))
        };
        sleep(settle).await;
        self.pace().await;

        // Classify
        let (current, markup) = self.current_page().await?;
        match self.classifier.classify(&current, &markup) {
            PageClass::HardError => {
                return Err(AttemptFailure::new(FailureKind::HardError, format!("error page at {current}")));
            }
            PageClass::Challenge => self.wait_for_challenge().await?,
            PageClass::Blocked | PageClass::Ok => {}
        }

        // Probe readiness
        let report = self.probe.probe(&mut self.driver).await?;
        tracing::debug!(
            url,
            scrolls = report.scrolls,
            anchor_found = report.anchor_found,
            "Readiness probe done"
        );

        // Validate
        let (current, markup) = self.current_page().await?;
        if self.classifier.is_off_domain(&current) {
            return Err(AttemptFailure::new(FailureKind::OffDomain, format!("left site for {current}")));
        }
        match self.classifier.classify(&current, &markup) {
            PageClass::Ok => {}
            PageClass::HardError => {
                return Err(AttemptFailure::new(FailureKind::HardError, format!("error page at {current}")));
            }
            PageClass::Challenge => {
                return Err(AttemptFailure::new(FailureKind::ChallengePending, "challenge reappeared"));
            }
            PageClass::Blocked => {
                return Err(AttemptFailure::new(
                    FailureKind::Blocked,
                    format!("thin page without product markers ({} bytes)", markup.len()),
                ));
            }
        }

        let title = resolve_title(&ProductPage::parse(&current, &markup));
        Ok(RenderedPage {
            url: url.to_string(),
            final_url: current,
            markup,
            title,
        })
    }

    async fn current_page(&mut self) -> AttemptResult<(String, String)> {
        let current = self.driver.current_url().await?;
        let markup = self.driver.page_source().await?;
        Ok((current, markup))
    }

    /// Polls a timed-out page in place until it has usable content
    async fn wait_for_content(&mut self) -> AttemptResult<()> {
        let deadline = Instant::now() + Duration::from_secs(self.config.content_wait_secs);
        let poll = Duration::from_millis(self.config.content_poll_ms);

        loop {
            let (current, markup) = self.current_page().await?;
            if self.classifier.is_hard_error_url(&current) {
                return Err(AttemptFailure::new(
                    FailureKind::Navigation,
                    format!("error page at {current} after timeout"),
                ));
            }
            if content_ready(&markup, &self.thresholds) {
                tracing::debug!(bytes = markup.len(), "Content ready despite timeout");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AttemptFailure::new(
                    FailureKind::Timeout,
                    format!("content not ready ({} bytes)", markup.len()),
                ));
            }
            sleep(poll).await;
        }
    }

    /// Waits for a challenge interstitial to clear
    async fn wait_for_challenge(&mut self) -> AttemptResult<()> {
        tracing::info!("Challenge detected, waiting for it to clear");
        let deadline = Instant::now() + Duration::from_secs(self.config.challenge_timeout_secs);
        let poll = Duration::from_millis(self.config.challenge_poll_ms);

        loop {
            sleep(poll).await;
            let (current, markup) = self.current_page().await?;
            if !self.classifier.is_challenge(&current, &markup) {
                tracing::info!(url = %current, "Challenge cleared");
                return Ok(());
            }
            if Instant::now() >= deadline {
                if self.classifier.has_substantial_content(&markup)
                    && !self.classifier.on_challenge_host(&current)
                {
                    tracing::warn!(url = %current, "Challenge wait timed out, content looks usable");
                    return Ok(());
                }
                return Err(AttemptFailure::new(
                    FailureKind::ChallengePending,
                    format!("challenge still present at {current}"),
                ));
            }
        }
    }

    /// A small scroll down and partway back up; failures are ignored
    async fn pace(&mut self) {
        let (down, up) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(200..=400), rng.gen_range(50..=100))
        };
        let _ = self.driver.execute(PageAction::ScrollBy(down)).await;
        let _ = self.driver.execute(PageAction::ScrollBy(-up)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::scripted::{ScriptedDriver, ScriptedNav};
    use crate::fetch::DelayRange;

    const URL: &str = "https://www.acurapartswarehouse.com/oem-acura-wheel/42700-tk4-a51.html";
    const PRODUCT: &str = r#"<html><head><title>Acura 42700-TK4-A51 Spare Wheel</title></head>
        <body><h1 class="product-title">Acura 42700-TK4-A51 Spare Wheel</h1></body></html>"#;
    const BLOCKED: &str =
        "<html><head><title>acurapartswarehouse.com</title></head><body></body></html>";

    fn controller(script: Vec<ScriptedNav>) -> FetchController<ScriptedDriver> {
        controller_with(script, Config::default())
    }

    fn controller_with(script: Vec<ScriptedNav>, config: Config) -> FetchController<ScriptedDriver> {
        FetchController::new(ScriptedDriver::new(script), &config, HealthState::shared()).unwrap()
    }

    fn single_attempt() -> Config {
        let mut config = Config::default();
        config.fetch.max_attempts = 1;
        config
    }

    fn nav_error() -> ScriptedNav {
        ScriptedNav::error(DriverError::Navigation("connection refused".to_string()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_attempt() {
        let mut c = controller(vec![ScriptedNav::page(URL, PRODUCT)]);
        let page = c.fetch(URL).await.unwrap();

        assert_eq!(page.url, URL);
        assert_eq!(page.final_url, URL);
        assert_eq!(page.title, "Acura 42700-TK4-A51 Spare Wheel");
        assert_eq!(c.history().len(), 1);
        assert_eq!(c.health().snapshot().successful, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_navigation_error_stops_after_five_attempts() {
        let mut c = controller((0..8).map(|_| nav_error()).collect());
        let err = c.fetch(URL).await.unwrap_err();

        assert!(matches!(err, FetchError::Fatal { .. }));
        assert_eq!(c.driver().navigations.len(), 5);
        assert_eq!(c.health().consecutive_failures(), 1);

        let history = c.history();
        assert_eq!(history.len(), 5);
        assert!(history
            .iter()
            .all(|a| a.failure == Some(FailureKind::Navigation)));
        for attempt in &history[..4] {
            assert!(DelayRange::secs(5, 8).contains(attempt.backoff.unwrap()));
        }
        assert_eq!(history[4].backoff, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_counts_terminal_failures_and_resets() {
        let mut script: Vec<ScriptedNav> = (0..10).map(|_| nav_error()).collect();
        script.push(ScriptedNav::page(URL, PRODUCT));
        let mut c = controller(script);

        assert!(c.fetch(URL).await.is_err());
        assert_eq!(c.health().consecutive_failures(), 1);
        assert!(c.fetch(URL).await.is_err());
        assert_eq!(c.health().consecutive_failures(), 2);

        assert!(c.fetch(URL).await.is_ok());
        assert_eq!(c.health().consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_circuit_skips_navigation() {
        let mut c = controller(vec![ScriptedNav::page(URL, PRODUCT)])
            .with_health_predicate(Arc::new(|_| false));

        let err = c.fetch(URL).await.unwrap_err();
        assert_eq!(err, FetchError::CircuitOpen { url: URL.to_string() });
        assert!(c.driver().navigations.is_empty());
        assert_eq!(c.health().consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_circuit_breaker_trips() {
        let mut config = single_attempt();
        config.fetch.max_consecutive_failures = 2;
        let mut c = controller_with((0..5).map(|_| nav_error()).collect(), config);

        assert!(matches!(c.fetch(URL).await, Err(FetchError::Fatal { .. })));
        assert!(matches!(c.fetch(URL).await, Err(FetchError::Fatal { .. })));
        assert!(matches!(c.fetch(URL).await, Err(FetchError::CircuitOpen { .. })));
        assert_eq!(c.driver().navigations.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecoverable_is_fatal_immediately() {
        let mut c = controller(vec![
            ScriptedNav::error(DriverError::Unrecoverable("session closed".to_string())),
            ScriptedNav::page(URL, PRODUCT),
        ]);
        assert!(matches!(c.fetch(URL).await, Err(FetchError::Fatal { .. })));
        assert_eq!(c.driver().navigations.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_page_backs_off_then_recovers() {
        let mut c = controller(vec![
            ScriptedNav::page(URL, BLOCKED),
            ScriptedNav::page(URL, BLOCKED),
            ScriptedNav::page(URL, PRODUCT),
        ]);
        let page = c.fetch(URL).await.unwrap();
        assert_eq!(page.title, "Acura 42700-TK4-A51 Spare Wheel");

        let history = c.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].failure, Some(FailureKind::Blocked));
        assert!(DelayRange::secs(40, 55).contains(history[0].backoff.unwrap()));
        // second block: 50-65s plus a 10-20s cooldown
        assert!(DelayRange::secs(60, 85).contains(history[1].backoff.unwrap()));
        assert_eq!(history[2].failure, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_challenge_clears() {
        let challenge = "https://www.acurapartswarehouse.com/cdn-cgi/challenge-platform/h/b";
        let mut c = controller(vec![ScriptedNav::page(challenge, "<title>Just a moment...</title>")
            .then_after(6, URL, PRODUCT)]);

        let page = c.fetch(URL).await.unwrap();
        assert_eq!(page.final_url, URL);
        assert_eq!(c.driver().navigations.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_challenge_that_never_clears() {
        let challenge = "https://challenges.cloudflare.com/turnstile";
        let mut c = controller_with(
            vec![ScriptedNav::page(challenge, "<title>Just a moment...</title>")],
            single_attempt(),
        );
        let err = c.fetch(URL).await.unwrap_err();
        assert!(matches!(err, FetchError::Fatal { reason, .. } if reason.starts_with("challenge_pending")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_with_ready_content_continues() {
        let text = "Genuine Acura spare wheel for TLX models. ".repeat(20);
        let markup = format!(
            "<html><body><h1>Acura Spare Wheel</h1><p>{text}</p>{}</body></html>",
            "<!-- filler -->".repeat(600)
        );
        let mut c = controller(vec![ScriptedNav::timeout(URL, &markup)]);

        let page = c.fetch(URL).await.unwrap();
        assert_eq!(page.title, "Acura Spare Wheel");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_without_content_fails_as_timeout() {
        let mut c = controller_with(vec![ScriptedNav::timeout(URL, "<p>loading</p>")], single_attempt());
        let err = c.fetch(URL).await.unwrap_err();
        assert!(matches!(err, FetchError::Fatal { reason, .. } if reason.starts_with("timeout")));
        assert_eq!(c.history()[0].failure, Some(FailureKind::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_page_during_content_wait_is_navigation_failure() {
        let mut c = controller_with(
            vec![ScriptedNav::timeout("chrome-error://chromewebdata/", "")],
            single_attempt(),
        );
        assert!(c.fetch(URL).await.is_err());
        assert_eq!(c.history()[0].failure, Some(FailureKind::Navigation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_off_domain_redirect() {
        let mut c = controller_with(
            vec![ScriptedNav::page("https://www.example.com/", PRODUCT)],
            single_attempt(),
        );
        assert!(c.fetch(URL).await.is_err());
        assert_eq!(c.history()[0].failure, Some(FailureKind::OffDomain));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_error_page() {
        let mut c = controller_with(
            vec![ScriptedNav::page("https://www.acurapartswarehouse.com/404", "<h1>Not found</h1>")],
            single_attempt(),
        );
        assert!(c.fetch(URL).await.is_err());
        assert_eq!(c.history()[0].failure, Some(FailureKind::HardError));
    }
}
