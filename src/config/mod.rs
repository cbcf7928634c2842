//! Configuration module for Fitment-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so an empty file (or no file at all) yields a
//! working configuration for the reference catalog.
//!
//! # Example
//!
//! ```no_run
//! use fitment_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Max attempts per URL: {}", config.fetch.max_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DiscoveryConfig, FetchConfig, OutputConfig, OutputFormat, RelevanceConfig,
    SiteConfig, Thresholds,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
