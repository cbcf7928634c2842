//! Static-markup driver backed by reqwest
//!
//! This driver renders nothing: the "page" is the response body, the current
//! URL is the final URL after redirects and scrolling never changes the
//! document height. It is enough for sites and test servers that serve their
//! product markup directly.

use super::{DriverError, PageAction, PageDriver};
use crate::config::FetchConfig;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Builds the HTTP client used by [`HttpDriver`]
///
/// # Example
///
/// ```
/// use fitment_harvester::config::FetchConfig;
/// use fitment_harvester::driver::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.navigation_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// A [`PageDriver`] that loads pages with plain HTTP GET requests
#[derive(Debug, Clone)]
pub struct HttpDriver {
    client: Client,
    current_url: String,
    source: String,
}

impl HttpDriver {
    /// Creates a driver from fetch configuration
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Creates a driver around an existing client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            current_url: "about:blank".to_string(),
            source: String::new(),
        }
    }
}

impl PageDriver for HttpDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.current_url = url.to_string();
        self.source.clear();

        let response = self.client.get(url).send().await.map_err(classify_error)?;

        self.current_url = response.url().to_string();
        let status = response.status();

        if status.is_server_error() {
            return Err(DriverError::Navigation(format!(
                "HTTP {} from {}",
                status.as_u16(),
                self.current_url
            )));
        }

        if !status.is_success() {
            tracing::debug!("HTTP {} from {}", status.as_u16(), self.current_url);
        }

        self.source = response.text().await.map_err(classify_error)?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.current_url.clone())
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        Ok(self.source.clone())
    }

    async fn execute(&mut self, _action: PageAction) -> Result<u64, DriverError> {
        Ok(self.source.len() as u64)
    }
}

/// Maps reqwest failures onto the driver error taxonomy
fn classify_error(e: reqwest::Error) -> DriverError {
    if e.is_timeout() {
        DriverError::Timeout(e.to_string())
    } else if e.is_builder() {
        DriverError::Unrecoverable(e.to_string())
    } else {
        DriverError::Navigation(e.to_string())
    }
}
