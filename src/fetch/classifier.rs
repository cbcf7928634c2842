//! Anti-bot page classification
//!
//! Decides from the current URL and markup alone whether a loaded page is
//! usable, still behind a challenge, blocked or an error page. Rules run in
//! a fixed order and the first match wins:
//!
//! 1. hard-error URL indicators, unless the URL is a normal product path
//! 2. challenge hosts in the URL, or small pages carrying challenge markers
//! 3. thin pages without product markers whose title is just the site name
//! 4. everything else is ok

use crate::config::Config;
use crate::extract::title::resolve_title;
use crate::extract::ProductPage;
use crate::url::is_on_domain;
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

/// URL fragments left behind by DNS, connection and HTTP error pages
const HARD_ERROR_INDICATORS: [&str; 11] = [
    "chrome-error://",
    "err_connection",
    "dns_probe",
    "/404",
    "/403",
    "?404",
    "?403",
    "error=404",
    "error=403",
    "status=404",
    "status=403",
];

static MARKER_CANDIDATES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, div, button").unwrap());
static SKU_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sku|part.*number").unwrap());
static PRICE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)product.*price|price.*product").unwrap());
static INFO_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)product.*info|product.*details").unwrap());
static CART_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)add.*cart|buy.*now").unwrap());

/// Verdict on a loaded page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageClass {
    Ok,
    Challenge,
    Blocked,
    HardError,
}

#[derive(Debug, Clone)]
pub struct AntiBotClassifier {
    domain: String,
    product_path: Regex,
    challenge_hosts: Vec<String>,
    challenge_markers: Vec<String>,
    substantial_content_bytes: usize,
    thin_page_bytes: usize,
}

impl AntiBotClassifier {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let product_path = Regex::new(&config.site.product_path_pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("product-path-pattern: {}", e))
        })?;

        Ok(Self {
            domain: config.site.domain.to_lowercase(),
            product_path,
            challenge_hosts: config.site.challenge_hosts.clone(),
            challenge_markers: config
                .site
                .challenge_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            substantial_content_bytes: config.thresholds.substantial_content_bytes,
            thin_page_bytes: config.thresholds.thin_page_bytes,
        })
    }

    /// Classifies the page the session is on
    pub fn classify(&self, current_url: &str, markup: &str) -> PageClass {
        if self.is_hard_error_url(current_url) {
            return PageClass::HardError;
        }
        if self.is_challenge(current_url, markup) {
            return PageClass::Challenge;
        }
        if self.is_blocked(current_url, markup) {
            return PageClass::Blocked;
        }
        PageClass::Ok
    }

    /// Error-page indicators in the URL, exempting product paths
    ///
    /// Part numbers such as `99403-xyz` can contain `403` or `404`, so a URL
    /// that matches the product path pattern is never a hard error.
    pub fn is_hard_error_url(&self, url: &str) -> bool {
        if self.product_path.is_match(url) {
            return false;
        }
        let lower = url.to_lowercase();
        HARD_ERROR_INDICATORS.iter().any(|i| lower.contains(i))
    }

    /// Whether the session is (still) on a challenge host
    pub fn on_challenge_host(&self, url: &str) -> bool {
        self.challenge_hosts.iter().any(|h| url.contains(h.as_str()))
    }

    pub fn is_challenge(&self, url: &str, markup: &str) -> bool {
        if self.on_challenge_host(url) {
            return true;
        }
        if markup.len() >= self.substantial_content_bytes {
            return false;
        }
        let lower = markup.to_lowercase();
        self.challenge_markers.iter().any(|m| lower.contains(m.as_str()))
    }

    /// Markup large enough to count as real content after a challenge timeout
    pub fn has_substantial_content(&self, markup: &str) -> bool {
        markup.len() > self.substantial_content_bytes
    }

    pub fn is_off_domain(&self, url: &str) -> bool {
        !is_on_domain(url, &self.domain)
    }

    /// Thin page, no product markers and a placeholder title
    ///
    /// Size or any single product marker is enough to rule out a block, even
    /// when the title has not rendered yet.
    pub fn is_blocked(&self, url: &str, markup: &str) -> bool {
        if markup.len() >= self.thin_page_bytes {
            return false;
        }
        let page = ProductPage::parse(url, markup);
        if has_product_markers(&page) {
            return false;
        }
        let title = resolve_title(&page).to_lowercase();
        self.is_placeholder_title(&title)
    }

    fn is_placeholder_title(&self, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return true;
        }
        let bare = self.domain.trim_start_matches("www.");
        let without_tld = bare.rsplit_once('.').map(|(name, _)| name).unwrap_or(bare);
        title == bare || title == format!("www.{}", bare) || title == without_tld
    }
}

/// Price, SKU or add-to-cart elements anywhere on the page
fn has_product_markers(page: &ProductPage) -> bool {
    page.html().select(&MARKER_CANDIDATES).any(|el| {
        let classes: Vec<&str> = el.value().classes().collect();
        let any = |re: &Regex| classes.iter().any(|c| re.is_match(c));
        match el.value().name() {
            "span" => any(&SKU_MARKER),
            "div" => any(&PRICE_MARKER) || any(&INFO_MARKER),
            "button" => any(&CART_MARKER),
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT: &str = "https://www.acurapartswarehouse.com/oem-acura-wheel/42700-tk4-a51.html";

    fn classifier() -> AntiBotClassifier {
        AntiBotClassifier::from_config(&Config::default()).unwrap()
    }

    fn padded(markup: &str, size: usize) -> String {
        let mut padded = markup.to_string();
        while padded.len() < size {
            padded.push_str("<!-- padding -->");
        }
        padded
    }

    #[test]
    fn test_thin_domain_titled_page_is_blocked() {
        let markup = padded(
            "<html><head><title>acurapartswarehouse.com</title></head><body><p>Please wait</p></body></html>",
            500,
        );
        assert!(markup.len() < 600);
        assert_eq!(classifier().classify(PRODUCT, &markup), PageClass::Blocked);
    }

    #[test]
    fn test_large_page_with_same_title_is_ok() {
        let markup = padded(
            "<html><head><title>acurapartswarehouse.com</title></head><body><p>Please wait</p></body></html>",
            20_000,
        );
        assert_eq!(classifier().classify(PRODUCT, &markup), PageClass::Ok);

        let empty_title = padded("<html><body></body></html>", 20_000);
        assert_eq!(classifier().classify(PRODUCT, &empty_title), PageClass::Ok);
    }

    #[test]
    fn test_thin_page_with_marker_is_ok() {
        let markup = r#"<html><head><title>acurapartswarehouse</title></head>
            <body><button class="btn-add-to-cart">Add</button></body></html>"#;
        assert_eq!(classifier().classify(PRODUCT, markup), PageClass::Ok);
    }

    #[test]
    fn test_thin_page_with_real_title_is_ok() {
        let markup = "<html><body><h1>Acura Spare Wheel</h1></body></html>";
        assert_eq!(classifier().classify(PRODUCT, markup), PageClass::Ok);
    }

    #[test]
    fn test_part_number_with_403_is_not_hard_error() {
        let c = classifier();
        assert!(!c.is_hard_error_url(
            "https://www.acurapartswarehouse.com/oem-acura-wheel-cap/99403-xyz.html"
        ));
        assert!(!c.is_hard_error_url("https://www.acurapartswarehouse.com/oem-acura-cap/403-xyz.html"));
        let big = padded("<h1>Acura Wheel Cap</h1>", 20_000);
        assert_eq!(
            c.classify("https://www.acurapartswarehouse.com/oem-acura-cap/403-xyz.html", &big),
            PageClass::Ok
        );
    }

    #[test]
    fn test_hard_error_urls() {
        let c = classifier();
        for url in [
            "chrome-error://chromewebdata/",
            "https://www.acurapartswarehouse.com/404",
            "https://www.acurapartswarehouse.com/page?status=403",
            "https://www.acurapartswarehouse.com/?ERR_CONNECTION_REFUSED",
        ] {
            assert_eq!(c.classify(url, ""), PageClass::HardError, "{url}");
        }
    }

    #[test]
    fn test_challenge_detection() {
        let c = classifier();
        assert_eq!(
            c.classify("https://challenges.cloudflare.com/turnstile", "<html></html>"),
            PageClass::Challenge
        );
        assert_eq!(
            c.classify(PRODUCT, "<html><title>Just a moment...</title></html>"),
            PageClass::Challenge
        );
        let large = padded("<html><title>Just a moment...</title><h1>Acura Wheel</h1>", 6000);
        assert_ne!(c.classify(PRODUCT, &large), PageClass::Challenge);
    }

    #[test]
    fn test_off_domain() {
        let c = classifier();
        assert!(!c.is_off_domain(PRODUCT));
        assert!(c.is_off_domain("https://www.google.com/"));
        assert!(c.is_off_domain("about:blank"));
    }
}
