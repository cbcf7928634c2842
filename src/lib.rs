//! Fitment-Harvester: resilient product and vehicle-fitment extraction
//!
//! This crate fetches fully-rendered product pages from a commerce site that
//! resists automated access, and extracts a fixed product schema plus the
//! vehicle fitments each part applies to. Fetching is driven by an explicit
//! retry state machine; every field is extracted by an ordered chain of
//! fallback strategies.

pub mod config;
pub mod discovery;
pub mod driver;
pub mod extract;
pub mod fetch;
pub mod fitment;
pub mod harvest;
pub mod output;
pub mod relevance;
pub mod url;

use thiserror::Error;

/// Main error type for Fitment-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Fitment-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{FieldExtractor, FitmentRow, ProductRecord};
pub use fetch::{FetchController, HealthState, RenderedPage};
pub use harvest::Harvester;
pub use url::{normalize_discovered_url, DiscoveredUrlSet};
