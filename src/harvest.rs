//! Harvest session orchestration
//!
//! A [`Harvester`] owns one rendering session: it discovers the catalog,
//! fetches every product page through the [`FetchController`] and writes the
//! flattened rows as they are produced. URLs are processed strictly one at a
//! time, and no per-URL failure ever aborts the batch.

use crate::config::Config;
use crate::discovery::UrlDiscoveryEngine;
use crate::driver::PageDriver;
use crate::extract::{ExtractError, FieldExtractor};
use crate::fetch::{FetchController, FetchError, HealthState};
use crate::output::{FlatRow, RowWriter, RunStats};
use crate::url::DiscoveredUrlSet;
use crate::HarvestError;
use std::sync::Arc;

/// One sequential fetch-and-extract session
pub struct Harvester<D: PageDriver> {
    controller: FetchController<D>,
    extractor: FieldExtractor,
    config: Config,
    stats: RunStats,
}

impl<D: PageDriver> Harvester<D> {
    /// Creates a session over `driver`
    ///
    /// # Arguments
    ///
    /// * `driver` - The rendering session used for every page
    /// * `config` - Validated configuration
    /// * `health` - Health counters, possibly shared with other sessions
    pub fn new(driver: D, config: Config, health: Arc<HealthState>) -> Result<Self, HarvestError> {
        let controller = FetchController::new(driver, &config, health)?;
        let extractor = FieldExtractor::from_config(&config)?;
        Ok(Self {
            controller,
            extractor,
            config,
            stats: RunStats::new(),
        })
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn controller(&self) -> &FetchController<D> {
        &self.controller
    }

    /// Fetches and extracts one product page
    ///
    /// Returns one row per fitment. An irrelevant, invalid or unreachable
    /// page yields no rows; the reason is logged and counted.
    pub async fn scrape_product(&mut self, url: &str) -> Vec<FlatRow> {
        self.stats.urls_attempted += 1;

        let page = match self.controller.fetch(url).await {
            Ok(page) => page,
            Err(FetchError::CircuitOpen { url }) => {
                tracing::warn!(url = %url, "Circuit open, skipping");
                self.stats.circuit_open += 1;
                return Vec::new();
            }
            Err(e) => {
                tracing::error!(url, error = %e, "Fetch failed");
                self.stats.fatal_fetches += 1;
                return Vec::new();
            }
        };

        match self.extractor.extract(&page) {
            Ok(record) => {
                self.stats.products_emitted += 1;
                let rows = record.flatten();
                tracing::info!(
                    url,
                    sku = %record.sku,
                    fitments = rows.len(),
                    "Extracted {}",
                    record.title
                );
                rows
            }
            Err(ExtractError::Irrelevant { .. }) => {
                self.stats.irrelevant += 1;
                Vec::new()
            }
            Err(ExtractError::MissingTitle { .. }) => {
                self.stats.invalid += 1;
                Vec::new()
            }
        }
    }

    /// Scrapes every URL in order, writing rows as each product completes
    ///
    /// Returns the number of rows written. Write failures are logged and
    /// counted like any other per-URL failure.
    pub async fn scrape_all(&mut self, urls: &[String], writer: &mut dyn RowWriter) -> u64 {
        let total = urls.len();
        let start_time = std::time::Instant::now();
        let mut written = 0;

        for (i, url) in urls.iter().enumerate() {
            tracing::debug!("[{}/{}] {}", i + 1, total, url);
            let rows = self.scrape_product(url).await;
            if !rows.is_empty() {
                match writer.write_rows(&rows) {
                    Ok(n) => written += n as u64,
                    Err(e) => {
                        tracing::error!(url = url.as_str(), error = %e, "Failed to write rows");
                        self.stats.write_errors += 1;
                    }
                }
            }

            if (i + 1) % 10 == 0 {
                let elapsed = start_time.elapsed();
                let rate = (i + 1) as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {}/{} URLs, {} products, {:.2} URLs/sec",
                    i + 1,
                    total,
                    self.stats.products_emitted,
                    rate
                );
            }
        }

        self.stats.rows_written += written;
        written
    }

    /// Runs every discovery strategy with this session's driver
    pub async fn discover(&mut self) -> Result<DiscoveredUrlSet, HarvestError> {
        let found = UrlDiscoveryEngine::new(self.controller.driver_mut(), &self.config)?
            .discover()
            .await;
        self.stats.urls_discovered = found.len() as u64;
        Ok(found)
    }

    /// Discovers the catalog and scrapes everything found
    pub async fn run_catalog(&mut self, writer: &mut dyn RowWriter) -> Result<RunStats, HarvestError> {
        let urls = self.discover().await?.into_vec();
        tracing::info!("Scraping {} candidate URLs", urls.len());

        self.scrape_all(&urls, writer).await;
        writer.finish()?;
        Ok(self.stats.clone())
    }
}
