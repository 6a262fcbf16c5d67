//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Pacing every request through the [`Pacer`]
//! - Optional bounded retry for transient failures
//! - Error classification

use crate::config::{Config, FetchConfig, UserAgentConfig};
use crate::crawler::pacer::{Pacer, RequestClass};
use crate::crawler::parser::Document;
use crate::HarvestError;
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `fetch` - Timeouts for the client
/// * `https_only` - Refuse plain-HTTP requests
///
/// # Example
///
/// ```no_run
/// use roster_harvest::config::{FetchConfig, UserAgentConfig};
/// use roster_harvest::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "RosterHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, &FetchConfig::default(), true).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetch: &FetchConfig,
    https_only: bool,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        user_agent.crawler_name,
        user_agent.crawler_version,
        user_agent.contact_url,
        user_agent.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(fetch.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .https_only(https_only)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Paced page fetcher
///
/// Owns the HTTP client and the pacer. Takes `&mut self` for every fetch, so
/// two fetches can never be in flight at once.
pub struct PageFetcher {
    client: Client,
    pacer: Pacer,
    max_retries: u32,
    retry_delay: Duration,
}

impl PageFetcher {
    pub fn new(client: Client, pacer: Pacer, fetch: &FetchConfig) -> Self {
        Self {
            client,
            pacer,
            max_retries: fetch.max_retries,
            retry_delay: Duration::from_millis(fetch.retry_delay_ms),
        }
    }

    /// Builds a fetcher from the full configuration
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let https_only = config.site.base_url.starts_with("https://");
        let client = build_http_client(&config.user_agent, &config.fetch, https_only)
            .map_err(HarvestError::Client)?;
        let pacer = Pacer::from_config(&config.politeness);

        Ok(Self::new(client, pacer, &config.fetch))
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// Waits out the politeness delay for `class`, then fetches and parses `url`
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Parse and return |
    /// | HTTP 5xx | Retry up to `max-retries` times |
    /// | Timeout / connect error | Retry up to `max-retries` times |
    /// | Anything else | Fail immediately |
    pub async fn fetch(&mut self, url: &str, class: RequestClass) -> Result<Document, HarvestError> {
        self.pacer.wait(class).await;

        let mut attempt = 0;
        let body = loop {
            match self.fetch_once(url).await {
                Ok(body) => break body,
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    attempt += 1;
                    tracing::warn!(
                        "Fetch of {} failed ({}), retry {}/{} in {:?}",
                        url,
                        e,
                        attempt,
                        self.max_retries,
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        };

        tracing::debug!("Fetched {} page {} ({} bytes)", class, url, body.len());
        Ok(Document::parse(&body))
    }

    async fn fetch_once(&self, url: &str) -> Result<String, HarvestError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| HarvestError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| HarvestError::Network {
            url: url.to_string(),
            source,
        })
    }
}

/// Whether a failed attempt is worth repeating
fn is_retryable(error: &HarvestError) -> bool {
    match error {
        HarvestError::Network { source, .. } => source.is_timeout() || source.is_connect(),
        HarvestError::HttpStatus { status, .. } => *status >= 500,
        _ => false,
    }
}
