use serde::Deserialize;

/// Main configuration structure for Fitment-Harvester
///
/// Every section is optional in the TOML file; missing sections and keys take
/// the defaults below, which target the Acura parts warehouse catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    pub thresholds: Thresholds,
    pub relevance: RelevanceConfig,
    pub discovery: DiscoveryConfig,
    pub output: OutputConfig,
}

/// Target site description
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Scheme and host every relative link is resolved against
    pub base_url: String,

    /// Bare domain the session must stay on (also used for the title-is-domain check)
    pub domain: String,

    /// Manufacturer used as the default make for list and table fitments
    pub manufacturer: String,

    /// Regex matching the site's normal product paths
    ///
    /// URLs matching this are never treated as hard-error pages, even when a
    /// part number in the path contains "403" or "404".
    pub product_path_pattern: String,

    /// Regex selecting candidate product links on listing pages
    pub product_link_pattern: String,

    /// Substrings of the current URL that identify a challenge interstitial
    pub challenge_hosts: Vec<String>,

    /// Lowercase markers that identify a small challenge page by its content
    pub challenge_markers: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.acurapartswarehouse.com".to_string(),
            domain: "acurapartswarehouse.com".to_string(),
            manufacturer: "Acura".to_string(),
            product_path_pattern: r"/oem-acura-|/oem/acura~".to_string(),
            product_link_pattern:
                r"/oem-acura-|/oem/acura~|/parts-list/.*wheels|/accessories/acura-".to_string(),
            challenge_hosts: vec![
                "challenges.cloudflare.com".to_string(),
                "/cdn-cgi/challenge".to_string(),
            ],
            challenge_markers: vec![
                "just a moment".to_string(),
                "checking your browser".to_string(),
                "cf-browser-verification".to_string(),
                "challenge-form".to_string(),
            ],
        }
    }
}

/// Retry loop, pacing and readiness timings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Upper bound on attempts per URL
    pub max_attempts: u32,

    /// User agent presented by the HTTP driver
    pub user_agent: String,

    /// Per-navigation timeout
    pub navigation_timeout_secs: u64,

    /// Randomized settle delay after navigation (milliseconds)
    pub settle_min_ms: u64,
    pub settle_max_ms: u64,

    /// How long to wait for a challenge interstitial to resolve
    pub challenge_timeout_secs: u64,

    /// Poll interval while waiting on a challenge
    pub challenge_poll_ms: u64,

    /// Maximum scroll actions per readiness probe
    pub scroll_ceiling: u32,

    /// Consecutive equal heights that count as "stable"
    pub stable_probes: u32,

    /// Pause between scroll actions (milliseconds)
    pub scroll_pause_ms: u64,

    /// Primary wait for a content anchor to appear
    pub anchor_timeout_secs: u64,

    /// Secondary wait when no anchor appeared in the primary window
    pub anchor_secondary_timeout_secs: u64,

    /// Extended in-place wait for content after a navigation timeout
    pub content_wait_secs: u64,

    /// Poll interval of the extended content wait (milliseconds)
    pub content_poll_ms: u64,

    /// Circuit breaker: consecutive terminal failures tolerated across a run
    pub max_consecutive_failures: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            navigation_timeout_secs: 30,
            settle_min_ms: 500,
            settle_max_ms: 1500,
            challenge_timeout_secs: 30,
            challenge_poll_ms: 2000,
            scroll_ceiling: 20,
            stable_probes: 3,
            scroll_pause_ms: 1000,
            anchor_timeout_secs: 10,
            anchor_secondary_timeout_secs: 5,
            content_wait_secs: 8,
            content_poll_ms: 500,
            max_consecutive_failures: 10,
        }
    }
}

/// Empirically tuned size and length thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Thresholds {
    /// Markup larger than this is never a challenge page, and counts as
    /// recovered when a challenge wait times out off the challenge host
    pub substantial_content_bytes: usize,

    /// Markup smaller than this is "thin" for blocked-page detection
    pub thin_page_bytes: usize,

    /// Body text needed before the timeout sub-loop accepts a page
    pub ready_body_text_chars: usize,

    /// Body text that makes a page ready even without a heading
    pub rich_body_text_chars: usize,

    /// Titles shorter than this invalidate the record
    pub min_title_chars: usize,

    /// Meta descriptions at or below this length are boilerplate
    pub min_meta_description_chars: usize,

    /// Descriptions shorter than this are supplemented from the specifications section
    pub min_description_chars: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            substantial_content_bytes: 5000,
            thin_page_bytes: 8000,
            ready_body_text_chars: 300,
            rich_body_text_chars: 500,
            min_title_chars: 3,
            min_meta_description_chars: 50,
            min_description_chars: 20,
        }
    }
}

/// Keyword lists for the relevance predicate
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    /// Keywords that mark a product as relevant
    pub keywords: Vec<String>,

    /// Keywords that veto relevance, checked first
    pub exclude: Vec<String>,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        let keywords = [
            "wheel cap",
            "wheel kit",
            "hub cap",
            "center cap",
            "hubcap",
            "wheel cover",
            "alloy wheel",
            "steel wheel",
            "aluminum wheel",
            "chrome wheel",
            "spoke wheel",
            "forged wheel",
            "cast wheel",
            "custom wheel",
            "rim",
            "alloy",
            "wheel",
            "disc wheel",
            "wheel set",
            "wheel assembly",
            "wheel rim",
            "complete wheel",
            "wheel disc",
            "rim cap",
            "disk",
            "wheel disk",
            "spare wheel",
            "rims",
            "wheels",
        ];
        let exclude = [
            "steering wheel",
            "wheel flange",
            "wheel bearing",
            "wheel spacer",
            "bearing hub",
            "hub bearing",
            "wheel hub",
            "hub bearing assembly",
            "bearing assembly",
            "wheel nut",
            "wheel stud",
            "wheel bolt",
            "wheel valve",
            "wheel weight",
            "wheel arch",
            "wheel well",
            "wheel sensor",
            "wheel speed sensor",
            "wheel cylinder",
            "wheel seal",
            "lug nut",
            "lug bolt",
            "tire pressure",
            "tpms",
            "wheel lock nut",
            "wheel lock key",
            "wheel alignment",
            "wheel opening",
            "wheel house",
            "wheel liner",
            "wheel adapter",
            "wheel mounting kit",
        ];
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            exclude: exclude.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Catalog discovery inputs
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Known category listing pages, as `/{slug}.html`
    pub category_pages: Vec<String>,

    /// Search terms used to surface individual product index pages
    pub oem_search_terms: Vec<String>,

    /// Model names searched for model-specific listing pages
    pub models: Vec<String>,

    /// Only the first `max-models` models are searched
    pub max_models: usize,

    /// Accessory listing pages, as `/accessories/{slug}.html`
    pub accessory_pages: Vec<String>,

    /// Generic categories browsed with pagination, as `/category/{slug}.html`
    pub browse_categories: Vec<String>,

    /// Site search URL templates tried in order; `{term}` is substituted
    pub search_paths: Vec<String>,

    /// Term used by the site-search fallback
    pub search_term: String,

    /// Query parameter that selects a listing page
    pub page_param: String,

    /// Safety limit on pages per listing
    pub max_pages: u32,

    /// Stop incrementing pages after this many pages without new links
    pub max_consecutive_empty: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            category_pages: strings(&[
                "oem-acura-spare_wheel",
                "oem-acura-rims",
                "oem-acura-wheel_cover",
                "oem-acura-alloy_wheel",
                "oem-acura-steel_wheel",
                "oem-acura-wheel_cap",
                "oem-acura-hub_cap",
                "oem-acura-center_cap",
            ]),
            oem_search_terms: strings(&["wheel", "rim", "spare wheel", "alloy wheel", "steel wheel"]),
            models: strings(&[
                "mdx", "rdx", "tlx", "ilx", "rlx", "tsx", "tl", "rl", "legend", "integra", "cl",
                "nsx", "slx", "vigor", "zdx",
            ]),
            max_models: 10,
            accessory_pages: strings(&[
                "acura-alloy_wheels",
                "acura-wheel_covers",
                "acura-wheel_caps",
                "acura-hub_caps",
                "acura-center_caps",
            ]),
            browse_categories: strings(&[
                "acura-chassis",
                "acura-body_air_conditioning",
                "acura-interior_bumper",
            ]),
            search_paths: strings(&[
                "/search?search_str={term}",
                "/search?q={term}",
                "/search/{term}",
            ]),
            search_term: "wheel".to_string(),
            page_param: "page".to_string(),
            max_pages: 500,
            max_consecutive_empty: 4,
        }
    }
}

/// Output format for flattened rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Tsv,
    Jsonl,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the flattened row file
    pub path: String,

    /// Row encoding
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./fitments.tsv".to_string(),
            format: OutputFormat::Tsv,
        }
    }
}
