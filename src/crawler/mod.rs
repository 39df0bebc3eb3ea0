//! Crawler module
//!
//! This module contains everything that runs a crawl against one source:
//! - The [`Crawler`] capability every site-specific crawler implements
//! - The [`Executor`] that invokes a crawler with timeout, isolation and
//!   minimum-yield enforcement
//! - A generic, configuration-driven [`HtmlLinkCrawler`] with its HTTP
//!   fetcher and link parser

mod executor;
mod fetcher;
mod html;
mod parser;

pub use executor::{dedupe_preserving_order, CrawlResult, CrawlStatus, Executor};
pub use fetcher::{build_http_client, fetch_page, FetchError};
pub use html::{HtmlLinkCrawler, DEFAULT_ARTICLE_PATTERNS};
pub use parser::extract_links;

use async_trait::async_trait;
use std::future::Future;
use url::Url;

/// A capability that extracts article URLs from one source
///
/// Implementations are black boxes to the rest of the crate: they may retry,
/// paginate or drive a browser internally. The executor only sees the final
/// list of URLs or an error.
#[async_trait]
pub trait Crawler: Send + Sync {
    /// Crawls `source` and returns the article URLs found, in discovery order
    async fn crawl(&self, source: &Url) -> anyhow::Result<Vec<String>>;
}

/// Adapts an async closure into a [`Crawler`]
///
/// # Example
///
/// ```
/// use url_harvest::crawler::FnCrawler;
///
/// let crawler = FnCrawler::new(|source: url::Url| async move {
///     Ok(vec![format!("{}/article/1", source.origin().ascii_serialization())])
/// });
/// # let _ = crawler;
/// ```
pub struct FnCrawler<F> {
    func: F,
}

impl<F> FnCrawler<F> {
    pub fn new<Fut>(func: F) -> Self
    where
        F: Fn(Url) -> Fut + Send + Sync,
        Fut: Future<Output = anyhow::Result<Vec<String>>> + Send,
    {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> Crawler for FnCrawler<F>
where
    F: Fn(Url) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<String>>> + Send,
{
    async fn crawl(&self, source: &Url) -> anyhow::Result<Vec<String>> {
        (self.func)(source.clone()).await
    }
}
