//! Page readiness probing
//!
//! Lazy-loaded sections only materialize once the page is scrolled, so the
//! probe scrolls until the document height stops changing and then waits
//! for a content anchor to show up.

use crate::config::{FetchConfig, Thresholds};
use crate::driver::{DriverError, PageAction, PageDriver};
use crate::extract::ProductPage;
use scraper::Selector;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::time::Instant;

static CONTENT_ANCHORS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "h1.product-title, h1, script#product_data, \
         [class*='fitment'], script[type='application/ld+json']",
    )
    .unwrap()
});

const ANCHOR_POLL: Duration = Duration::from_millis(500);

/// What a readiness probe observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessReport {
    pub scrolls: u32,
    pub final_height: u64,
    /// Height held steady for the required number of probes
    pub height_stable: bool,
    pub anchor_found: bool,
}

#[derive(Debug, Clone)]
pub struct PageReadinessProbe {
    scroll_ceiling: u32,
    stable_probes: u32,
    scroll_pause: Duration,
    anchor_timeout: Duration,
    anchor_secondary_timeout: Duration,
}

impl PageReadinessProbe {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            scroll_ceiling: config.scroll_ceiling,
            stable_probes: config.stable_probes.max(1),
            scroll_pause: Duration::from_millis(config.scroll_pause_ms),
            anchor_timeout: Duration::from_secs(config.anchor_timeout_secs),
            anchor_secondary_timeout: Duration::from_secs(config.anchor_secondary_timeout_secs),
        }
    }

    /// Scrolls until stable, then waits for a content anchor
    ///
    /// A missing anchor is not an error; validation decides what to make of
    /// the page afterwards.
    pub async fn probe<D: PageDriver>(&self, driver: &mut D) -> Result<ReadinessReport, DriverError> {
        let (scrolls, final_height, height_stable) = self.scroll_until_stable(driver).await?;
        tracing::debug!(scrolls, final_height, height_stable, "Scroll probe finished");

        let mut anchor_found = self.wait_for_anchor(driver, self.anchor_timeout).await?;
        if !anchor_found {
            tracing::debug!("No content anchor yet, waiting a little longer");
            anchor_found = self
                .wait_for_anchor(driver, self.anchor_secondary_timeout)
                .await?;
        }

        Ok(ReadinessReport {
            scrolls,
            final_height,
            height_stable,
            anchor_found,
        })
    }

    /// Scrolls to the bottom until the height repeats `stable-probes` times
    /// or the scroll ceiling is hit
    ///
    /// Returns the number of scrolls, the last height and whether it was stable.
    pub async fn scroll_until_stable<D: PageDriver>(
        &self,
        driver: &mut D,
    ) -> Result<(u32, u64, bool), DriverError> {
        let mut scrolls = 0;
        let mut last_height = None;
        let mut same_height = 0;
        let mut final_height = 0;

        while scrolls < self.scroll_ceiling {
            let height = driver.execute(PageAction::ScrollToBottom).await?;
            scrolls += 1;
            final_height = height;

            if last_height == Some(height) {
                same_height += 1;
            } else {
                same_height = 1;
                last_height = Some(height);
            }
            if same_height >= self.stable_probes {
                break;
            }
            tokio::time::sleep(self.scroll_pause).await;
        }

        Ok((scrolls, final_height, same_height >= self.stable_probes))
    }

    async fn wait_for_anchor<D: PageDriver>(
        &self,
        driver: &mut D,
        timeout: Duration,
    ) -> Result<bool, DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            let markup = driver.page_source().await?;
            if has_content_anchor(&markup) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(ANCHOR_POLL).await;
        }
    }
}

/// Title heading, product JSON, fitment container or JSON-LD present
pub fn has_content_anchor(markup: &str) -> bool {
    let page = ProductPage::parse("about:blank", markup);
    page.select_first(&CONTENT_ANCHORS).is_some()
}

/// Whether a page that timed out has nonetheless loaded enough to use
pub fn content_ready(markup: &str, thresholds: &Thresholds) -> bool {
    if markup.len() <= thresholds.thin_page_bytes {
        return false;
    }
    let page = ProductPage::parse("about:blank", markup);
    let text_len = page.body_text().chars().count();
    text_len > thresholds.ready_body_text_chars
        && (page.has_heading() || text_len > thresholds.rich_body_text_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::scripted::{ScriptedDriver, ScriptedNav};

    const URL: &str = "https://www.acurapartswarehouse.com/oem-acura-wheel/42700-tk4-a51.html";

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_height_is_stable() {
        let mut driver = ScriptedDriver::new(vec![ScriptedNav::page(URL, "<h1>Wheel</h1>")])
            .with_heights(vec![1000, 1800, 2400, 2400, 2400, 9999]);
        driver.navigate(URL).await.unwrap();

        let report = PageReadinessProbe::new(&FetchConfig::default())
            .probe(&mut driver)
            .await
            .unwrap();

        assert_eq!(report.scrolls, 5);
        assert_eq!(report.final_height, 2400);
        assert!(report.height_stable);
        assert!(report.anchor_found);
        assert!(driver
            .actions
            .iter()
            .all(|a| *a == PageAction::ScrollToBottom));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_ceiling() {
        let heights = (1..=50).map(|h| h * 100).collect();
        let mut driver =
            ScriptedDriver::new(vec![ScriptedNav::page(URL, "<h1>Wheel</h1>")]).with_heights(heights);
        driver.navigate(URL).await.unwrap();

        let config = FetchConfig {
            scroll_ceiling: 4,
            ..FetchConfig::default()
        };
        let report = PageReadinessProbe::new(&config).probe(&mut driver).await.unwrap();
        assert_eq!(report.scrolls, 4);
        assert!(!report.height_stable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_anchor_appears_late() {
        let mut driver = ScriptedDriver::new(vec![ScriptedNav::page(URL, "<p>loading</p>")
            .then_after(12, URL, r#"<script id="product_data" type="application/json">{}</script>"#)]);
        driver.navigate(URL).await.unwrap();

        let report = PageReadinessProbe::new(&FetchConfig::default())
            .probe(&mut driver)
            .await
            .unwrap();
        assert!(report.anchor_found);
    }

    #[tokio::test(start_paused = true)]
    async fn test_anchor_never_appears() {
        let mut driver = ScriptedDriver::new(vec![ScriptedNav::page(URL, "<p>loading</p>")]);
        driver.navigate(URL).await.unwrap();

        let report = PageReadinessProbe::new(&FetchConfig::default())
            .probe(&mut driver)
            .await
            .unwrap();
        assert!(!report.anchor_found);
    }

    #[test]
    fn test_content_ready() {
        let thresholds = Thresholds::default();
        let text = "Genuine Acura spare wheel. ".repeat(15);
        let padding = "<!-- filler -->".repeat(600);

        let with_heading = format!("<html><body><h1>Wheel</h1><p>{text}</p>{padding}</body></html>");
        assert!(content_ready(&with_heading, &thresholds));

        let no_heading = format!("<html><body><p>{text}</p>{padding}</body></html>");
        assert!(!content_ready(&no_heading, &thresholds));

        let rich = format!("<html><body><p>{}</p>{padding}</body></html>", text.repeat(2));
        assert!(content_ready(&rich, &thresholds));

        let small = format!("<html><body><h1>Wheel</h1><p>{text}</p></body></html>");
        assert!(!content_ready(&small, &thresholds));
    }
}
