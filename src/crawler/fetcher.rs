//! HTTP fetcher implementation
//!
//! This module handles the HTTP requests made by the generic crawler:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for listing pages
//! - Error classification (status, content type, network)

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum number of redirects followed for one request
const MAX_REDIRECTS: usize = 10;

/// Errors that can occur while fetching a listing page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("{url} is not HTML (Content-Type: {content_type})")]
    NotHtml { url: String, content_type: String },

    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use url_harvest::config::UserAgentConfig;
/// use url_harvest::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "UrlHarvest".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "ops@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page and returns its body
///
/// # Errors
///
/// | Condition | Error |
/// |-----------|-------|
/// | Non-2xx status after redirects | `Status` |
/// | Content-Type present and not HTML | `NotHtml` |
/// | Connect/timeout/body read failure | `Network` |
pub async fn fetch_page(client: &Client, url: &Url) -> Result<String, FetchError> {
    let network = |source: reqwest::Error| FetchError::Network {
        url: url.to_string(),
        source,
    };

    let response = client.get(url.as_str()).send().await.map_err(network)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase());

    if let Some(content_type) = content_type {
        if !is_html(&content_type) {
            return Err(FetchError::NotHtml {
                url: url.to_string(),
                content_type,
            });
        }
    }

    response.text().await.map_err(network)
}

fn is_html(content_type: &str) -> bool {
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}
