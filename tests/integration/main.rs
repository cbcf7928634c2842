//! Integration tests for Fitment-Harvester
//!
//! Product and listing pages are served by a wiremock server and fetched
//! through the reqwest-backed driver.

mod config_tests;
mod harvest_tests;
