//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! The generic HTML crawler consults it before fetching listing pages.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::ParsedRobots;

use reqwest::Client;
use url::Url;

/// Returns the cache key for a URL's origin
pub fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Fetches robots.txt for the origin of `url`
///
/// Any failure to obtain a robots.txt (network error, non-success status,
/// unreadable body) yields an allow-all result.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - Any URL on the site
pub async fn fetch_robots(client: &Client, url: &Url) -> ParsedRobots {
    let robots_url = match url.join("/robots.txt") {
        Ok(robots_url) => robots_url,
        Err(_) => return ParsedRobots::allow_all(),
    };

    match client.get(robots_url.as_str()).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => ParsedRobots::from_content(&body),
            Err(e) => {
                tracing::debug!("Could not read {}: {}", robots_url, e);
                ParsedRobots::allow_all()
            }
        },
        Ok(response) => {
            tracing::debug!(
                "No robots.txt at {} (HTTP {})",
                robots_url,
                response.status().as_u16()
            );
            ParsedRobots::allow_all()
        }
        Err(e) => {
            tracing::debug!("Could not fetch {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}

/// Returns robots.txt for the origin of `url`, fetching it on a cache miss
pub async fn robots_for(client: &Client, cache: &RobotsCache, url: &Url) -> ParsedRobots {
    let origin = origin_key(url);
    if let Some(robots) = cache.get(&origin).await {
        return robots;
    }

    let robots = fetch_robots(client, url).await;
    cache.insert(&origin, robots.clone()).await;
    robots
}
