//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the ingester, including:
//! - Building HTTP clients with proper user agent strings and a request deadline
//! - Resolving site-relative hrefs against the configured base URL
//! - GET requests for HTML pages and binary assets
//! - Error classification (transport failure vs. non-success status)
//!
//! Failures are never retried; the caller aborts the run.

use crate::config::{Config, UserAgentConfig};
use crate::{CrawlerError, Result};
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

/// An HTML page fetched successfully
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub status_code: u16,
    pub content_type: String,
    pub body: String,
}

/// A binary resource (cover image) fetched successfully
#[derive(Debug, Clone)]
pub struct FetchedBinary {
    pub url: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use novel_ripple::config::UserAgentConfig;
/// use novel_ripple::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "NovelRipple".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(50)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> std::result::Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages of one site
///
/// Every href handed to the fetcher may be site-relative (`/my-novel.html`)
/// or absolute; both are resolved against the base URL.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    base_url: Url,
}

impl Fetcher {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Builds the fetcher described by the `[source]` and `[user-agent]` sections
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_millis(config.source.request_timeout_ms);
        let client = build_http_client(&config.user_agent, timeout)?;
        let base_url = Url::parse(&config.source.base_url)?;
        Ok(Self::new(client, base_url))
    }

    /// Resolves an href against the base URL
    pub fn resolve(&self, href: &str) -> Result<Url> {
        Ok(self.base_url.join(href.trim())?)
    }

    /// Fetches an HTML page
    pub async fn fetch_page(&self, href: &str) -> Result<FetchedPage> {
        let (url, response) = self.send(href).await?;
        let status_code = response.status().as_u16();
        let content_type = content_type_of(&response);

        let body = response.text().await.map_err(|source| CrawlerError::Fetch {
            url: url.to_string(),
            source,
        })?;

        Ok(FetchedPage {
            url: url.to_string(),
            status_code,
            content_type,
            body,
        })
    }

    /// Fetches a binary resource, keeping its content type
    pub async fn fetch_binary(&self, href: &str) -> Result<FetchedBinary> {
        let (url, response) = self.send(href).await?;
        let content_type = content_type_of(&response);

        let bytes = response.bytes().await.map_err(|source| CrawlerError::Fetch {
            url: url.to_string(),
            source,
        })?;

        Ok(FetchedBinary {
            url: url.to_string(),
            content_type,
            bytes: bytes.to_vec(),
        })
    }

    async fn send(&self, href: &str) -> Result<(Url, Response)> {
        let url = self.resolve(href)?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| CrawlerError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlerError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok((url, response))
    }
}

fn content_type_of(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string()
}
