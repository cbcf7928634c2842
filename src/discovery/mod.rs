//! Catalog discovery
//!
//! [`UrlDiscoveryEngine`] walks the site's listing pages and collects every
//! candidate product URL into one [`DiscoveredUrlSet`]. Discovery favors
//! recall: a link is kept when its URL matches the product link pattern and
//! its URL or anchor text passes the relevance filter. Precision is enforced
//! later, at extraction time.
//!
//! Strategies run in this order, though only latency depends on it:
//!
//! 1. known category listing pages
//! 2. site searches for individual product pages
//! 3. model-specific searches, following the listing pages they return
//! 4. accessory listing pages
//! 5. generic category browsing
//! 6. a site-search fallback over several search URL shapes

mod pagination;

pub use pagination::{page_url, total_pages};

use crate::config::{Config, DiscoveryConfig};
use crate::driver::{DriverError, PageDriver};
use crate::extract::page::element_text;
use crate::extract::ProductPage;
use crate::fetch::PageReadinessProbe;
use crate::relevance::RelevanceFilter;
use crate::url::{is_on_domain, normalize_discovered_url, DiscoveredUrlSet};
use crate::ConfigError;
use rand::Rng;
use regex::Regex;
use scraper::Selector;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// A link found on a listing page, already normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLink {
    pub url: String,
    pub text: String,
}

/// Collects candidate product URLs from listing pages
pub struct UrlDiscoveryEngine<'d, D: PageDriver> {
    driver: &'d mut D,
    base: Url,
    domain: String,
    config: DiscoveryConfig,
    product_links: Regex,
    product_path: Regex,
    relevance: RelevanceFilter,
    scroller: PageReadinessProbe,
    pacing: (u64, u64),
}

impl<'d, D: PageDriver> UrlDiscoveryEngine<'d, D> {
    pub fn new(driver: &'d mut D, config: &Config) -> Result<Self, ConfigError> {
        let base = Url::parse(&config.site.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("base-url: {}", e)))?;
        let product_links = Regex::new(&config.site.product_link_pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("product-link-pattern: {}", e)))?;
        let product_path = Regex::new(&config.site.product_path_pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("product-path-pattern: {}", e)))?;

        Ok(Self {
            driver,
            base,
            domain: config.site.domain.clone(),
            config: config.discovery.clone(),
            product_links,
            product_path,
            relevance: RelevanceFilter::new(&config.relevance)?,
            scroller: PageReadinessProbe::new(&config.fetch),
            pacing: (config.fetch.settle_min_ms, config.fetch.settle_max_ms),
        })
    }

    /// Seed listing URLs, in strategy order, without touching the network
    pub fn plan(&self) -> Vec<String> {
        let mut seeds = Vec::new();
        seeds.extend(self.category_urls());
        seeds.extend(self.config.oem_search_terms.iter().filter_map(|t| self.search_url(0, t)));
        seeds.extend(
            self.config
                .models
                .iter()
                .take(self.config.max_models)
                .filter_map(|m| self.search_url(0, &format!("{} wheels", m))),
        );
        seeds.extend(self.accessory_urls());
        seeds.extend(self.browse_urls());
        seeds.extend(
            (0..self.config.search_paths.len())
                .filter_map(|i| self.search_url(i, &self.config.search_term)),
        );
        seeds
    }

    /// Runs every strategy and unions their results
    pub async fn discover(&mut self) -> DiscoveredUrlSet {
        let mut all = DiscoveredUrlSet::new();

        let found = self.discover_category_pages().await;
        tracing::info!("Category pages: {} URLs", found.len());
        all.merge(found);

        let found = self.discover_search_terms().await;
        tracing::info!("Product searches: {} URLs", found.len());
        all.merge(found);

        let found = self.discover_model_pages().await;
        tracing::info!("Model searches: {} URLs", found.len());
        all.merge(found);

        let found = self.discover_accessory_pages().await;
        tracing::info!("Accessory pages: {} URLs", found.len());
        all.merge(found);

        let found = self.browse_categories().await;
        tracing::info!("Category browsing: {} URLs", found.len());
        all.merge(found);

        let found = self.search_fallback().await;
        let added = all.merge(found);
        tracing::info!("Site search added {} URLs", added);

        tracing::info!("Discovered {} unique candidate URLs", all.len());
        all
    }

    /// Known category listing pages, with pagination
    pub async fn discover_category_pages(&mut self) -> DiscoveredUrlSet {
        let mut found = DiscoveredUrlSet::new();
        for url in self.category_urls() {
            self.harvest_paginated(&url, &mut found).await;
        }
        found
    }

    /// Site searches that surface individual product pages
    pub async fn discover_search_terms(&mut self) -> DiscoveredUrlSet {
        let mut found = DiscoveredUrlSet::new();
        let terms = self.config.oem_search_terms.clone();
        for term in terms {
            if let Some(url) = self.search_url(0, &term) {
                self.harvest(&url, &mut found).await;
            }
        }
        found
    }

    /// Searches "{model} wheels" and follows the listing pages returned
    ///
    /// Product pages in the results are kept directly; other candidate links
    /// are model listings whose product links are collected one level down.
    pub async fn discover_model_pages(&mut self) -> DiscoveredUrlSet {
        let mut found = DiscoveredUrlSet::new();
        let models: Vec<String> = self
            .config
            .models
            .iter()
            .take(self.config.max_models)
            .cloned()
            .collect();

        let mut visited = BTreeSet::new();
        for model in models {
            let Some(url) = self.search_url(0, &format!("{} wheels", model)) else {
                continue;
            };
            let Some(markup) = self.load(&url).await else {
                continue;
            };

            let mut listings = BTreeSet::new();
            for link in self.candidate_links(&markup, &url) {
                if self.product_path.is_match(&link.url) {
                    self.keep(&link, &mut found);
                } else if self.relevance.matches_link(&link.url, &link.text) {
                    listings.insert(link.url);
                }
            }

            for listing in listings {
                if visited.insert(listing.clone()) {
                    self.harvest(&listing, &mut found).await;
                }
            }
        }
        found
    }

    /// Accessory listing pages
    pub async fn discover_accessory_pages(&mut self) -> DiscoveredUrlSet {
        let mut found = DiscoveredUrlSet::new();
        for url in self.accessory_urls() {
            self.harvest(&url, &mut found).await;
        }
        found
    }

    /// Generic category pages, with pagination
    pub async fn browse_categories(&mut self) -> DiscoveredUrlSet {
        let mut found = DiscoveredUrlSet::new();
        for url in self.browse_urls() {
            self.harvest_paginated(&url, &mut found).await;
        }
        found
    }

    /// Tries each search URL shape until one returns candidate links
    pub async fn search_fallback(&mut self) -> DiscoveredUrlSet {
        let mut found = DiscoveredUrlSet::new();
        let term = self.config.search_term.clone();
        for i in 0..self.config.search_paths.len() {
            let Some(url) = self.search_url(i, &term) else {
                continue;
            };
            let Some(markup) = self.load(&url).await else {
                continue;
            };
            let links = self.candidate_links(&markup, &url);
            if links.is_empty() {
                tracing::warn!("No product links with search URL {}", url);
                continue;
            }
            for link in &links {
                self.keep(link, &mut found);
            }
            break;
        }
        found
    }

    fn category_urls(&self) -> Vec<String> {
        self.config
            .category_pages
            .iter()
            .filter_map(|slug| self.site_url(&format!("/{}.html", slug)))
            .collect()
    }

    fn accessory_urls(&self) -> Vec<String> {
        self.config
            .accessory_pages
            .iter()
            .filter_map(|slug| self.site_url(&format!("/accessories/{}.html", slug)))
            .collect()
    }

    fn browse_urls(&self) -> Vec<String> {
        self.config
            .browse_categories
            .iter()
            .filter_map(|slug| self.site_url(&format!("/category/{}.html", slug)))
            .collect()
    }

    /// Search URL from the `index`-th search path template
    fn search_url(&self, index: usize, term: &str) -> Option<String> {
        let template = self.config.search_paths.get(index)?;
        let encoded: String = url::form_urlencoded::byte_serialize(term.as_bytes()).collect();
        self.site_url(&template.replace("{term}", &encoded))
    }

    fn site_url(&self, path: &str) -> Option<String> {
        self.base.join(path).ok().map(|u| u.to_string())
    }

    /// Loads a listing page, scrolling until lazy content has settled
    ///
    /// Failures are logged and yield `None`; discovery never aborts on a
    /// single listing.
    async fn load(&mut self, url: &str) -> Option<String> {
        tracing::debug!("Loading listing {}", url);
        match self.driver.navigate(url).await {
            Ok(()) | Err(DriverError::Timeout(_)) => {}
            Err(e) => {
                tracing::warn!("Failed to load listing {}: {}", url, e);
                return None;
            }
        }

        if let Err(e) = self.scroller.scroll_until_stable(&mut *self.driver).await {
            tracing::debug!("Scrolling {} failed: {}", url, e);
        }

        let markup = match self.driver.page_source().await {
            Ok(markup) => markup,
            Err(e) => {
                tracing::warn!("Failed to read listing {}: {}", url, e);
                return None;
            }
        };

        let pause = {
            let (lo, hi) = self.pacing;
            Duration::from_millis(rand::thread_rng().gen_range(lo.min(hi)..=hi.max(lo)))
        };
        tokio::time::sleep(pause).await;
        Some(markup)
    }

    /// Loads one listing and keeps its relevant product links
    async fn harvest(&mut self, url: &str, found: &mut DiscoveredUrlSet) -> usize {
        let Some(markup) = self.load(url).await else {
            return 0;
        };
        let links = self.candidate_links(&markup, url);
        let added = links.iter().filter(|l| self.keep(l, found)).count();
        tracing::debug!("{}: {} candidate links, {} new", url, links.len(), added);
        added
    }

    /// Harvests a listing and the rest of its pages
    ///
    /// With a known page count every page is visited; otherwise the page
    /// parameter is incremented until several consecutive pages add nothing.
    async fn harvest_paginated(&mut self, url: &str, found: &mut DiscoveredUrlSet) {
        let Some(markup) = self.load(url).await else {
            return;
        };
        let links = self.candidate_links(&markup, url);
        for link in &links {
            self.keep(link, found);
        }

        let param = self.config.page_param.clone();
        let max_pages = self.config.max_pages;

        match total_pages(&markup, &param) {
            Some(total) => {
                tracing::debug!("{}: {} pages", url, total);
                for n in 2..=total.min(max_pages) {
                    if let Some(next) = page_url(url, &param, n) {
                        self.harvest(&next, found).await;
                    }
                }
            }
            None => {
                let mut empty = 0;
                let mut last = 1;
                for n in 2..=max_pages {
                    if empty >= self.config.max_consecutive_empty {
                        break;
                    }
                    let added = match page_url(url, &param, n) {
                        Some(next) => self.harvest(&next, found).await,
                        None => 0,
                    };
                    if added == 0 {
                        empty += 1;
                    } else {
                        empty = 0;
                    }
                    last = n;
                }
                tracing::debug!("{}: stopped after page {}", url, last);
            }
        }
    }

    /// Links on a listing that look like product or listing pages of the site
    pub fn candidate_links(&self, markup: &str, page_url: &str) -> Vec<ListingLink> {
        let base = Url::parse(page_url).unwrap_or_else(|_| self.base.clone());
        let page = ProductPage::parse(page_url, markup);
        page.html()
            .select(&ANCHORS)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                let url = normalize_discovered_url(href, &base).ok()?;
                if !is_on_domain(&url, &self.domain) || !self.product_links.is_match(&url) {
                    return None;
                }
                Some(ListingLink {
                    url,
                    text: element_text(a),
                })
            })
            .collect()
    }

    /// Inserts a relevant link, returning whether it was new
    fn keep(&self, link: &ListingLink, found: &mut DiscoveredUrlSet) -> bool {
        self.relevance.matches_link(&link.url, &link.text) && found.insert(&link.url, &self.base)
    }
}
