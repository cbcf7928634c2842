use crate::config::types::{
    Config, DiscoveryConfig, FetchConfig, OutputConfig, RelevanceConfig, SiteConfig, Thresholds,
};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_fetch_config(&config.fetch)?;
    validate_thresholds(&config.thresholds)?;
    validate_relevance_config(&config.relevance)?;
    validate_discovery_config(&config.discovery)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target site description
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use HTTP or HTTPS, got '{}'",
            config.base_url
        )));
    }

    validate_domain_string(&config.domain)?;

    for (name, pattern) in [
        ("product-path-pattern", &config.product_path_pattern),
        ("product-link-pattern", &config.product_link_pattern),
    ] {
        Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("{} '{}': {}", name, pattern, e)))?;
    }

    if config.challenge_hosts.iter().any(|h| h.is_empty()) {
        return Err(ConfigError::Validation(
            "challenge-hosts cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry and readiness timings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 20 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 20, got {}",
            config.max_attempts
        )));
    }

    if config.settle_min_ms > config.settle_max_ms {
        return Err(ConfigError::Validation(format!(
            "settle-min-ms ({}) must not exceed settle-max-ms ({})",
            config.settle_min_ms, config.settle_max_ms
        )));
    }

    if config.stable_probes < 1 {
        return Err(ConfigError::Validation(
            "stable-probes must be >= 1".to_string(),
        ));
    }

    if config.challenge_poll_ms == 0 || config.content_poll_ms == 0 {
        return Err(ConfigError::Validation(
            "poll intervals must be greater than zero".to_string(),
        ));
    }

    if config.navigation_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "navigation-timeout-secs must be greater than zero".to_string(),
        ));
    }

    if config.max_consecutive_failures < 1 {
        return Err(ConfigError::Validation(
            "max-consecutive-failures must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the size and length thresholds
fn validate_thresholds(thresholds: &Thresholds) -> Result<(), ConfigError> {
    let named = [
        ("substantial-content-bytes", thresholds.substantial_content_bytes),
        ("thin-page-bytes", thresholds.thin_page_bytes),
        ("ready-body-text-chars", thresholds.ready_body_text_chars),
        ("rich-body-text-chars", thresholds.rich_body_text_chars),
        ("min-title-chars", thresholds.min_title_chars),
    ];

    for (name, value) in named {
        if value == 0 {
            return Err(ConfigError::Validation(format!(
                "{} must be greater than zero",
                name
            )));
        }
    }

    Ok(())
}

/// Validates relevance keyword lists
fn validate_relevance_config(config: &RelevanceConfig) -> Result<(), ConfigError> {
    if config.keywords.is_empty() {
        return Err(ConfigError::Validation(
            "relevance keywords cannot be empty".to_string(),
        ));
    }

    if config
        .keywords
        .iter()
        .chain(config.exclude.iter())
        .any(|k| k.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "relevance keywords cannot contain blank entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates discovery inputs
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.page_param.is_empty() {
        return Err(ConfigError::Validation(
            "page-param cannot be empty".to_string(),
        ));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1".to_string(),
        ));
    }

    if config.max_consecutive_empty < 1 {
        return Err(ConfigError::Validation(
            "max-consecutive-empty must be >= 1".to_string(),
        ));
    }

    for path in &config.search_paths {
        if !path.starts_with('/') || !path.contains("{term}") {
            return Err(ConfigError::Validation(format!(
                "search path '{}' must start with '/' and contain '{{term}}'",
                path
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a bare domain string
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
