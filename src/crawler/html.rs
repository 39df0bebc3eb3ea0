//! Generic configuration-driven crawler
//!
//! Fetches a source listing page (and optionally its numbered follow-up
//! pages), extracts anchor links and keeps the ones that look like article
//! URLs on the source's own site.

use crate::config::CrawlerEntry;
use crate::crawler::fetcher::fetch_page;
use crate::crawler::parser::extract_links;
use crate::crawler::Crawler;
use crate::robots::{robots_for, ParsedRobots, RobotsCache};
use crate::url::site_host;
use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Path fragments used when a crawler entry lists no article patterns
pub const DEFAULT_ARTICLE_PATTERNS: &[&str] = &["/article/", "/news/", ".html", "/detail/", "/story/"];

/// Crawler that harvests article links from HTML listing pages
#[derive(Debug, Clone)]
pub struct HtmlLinkCrawler {
    name: String,
    client: Client,
    robots: Option<Arc<RobotsCache>>,
    robots_agent: String,
    article_patterns: Vec<String>,
    page_param: Option<String>,
    max_pages: u32,
    page_delay: Duration,
}

impl HtmlLinkCrawler {
    /// Builds a crawler from its configuration entry
    ///
    /// # Arguments
    ///
    /// * `entry` - The `[[crawler]]` entry
    /// * `client` - Shared HTTP client (carries the user agent)
    /// * `robots` - Shared robots.txt cache
    /// * `robots_agent` - Product token matched against robots.txt groups
    pub fn from_entry(
        entry: &CrawlerEntry,
        client: Client,
        robots: Arc<RobotsCache>,
        robots_agent: &str,
    ) -> Self {
        let article_patterns = if entry.article_patterns.is_empty() {
            DEFAULT_ARTICLE_PATTERNS.iter().map(|p| p.to_string()).collect()
        } else {
            entry.article_patterns.clone()
        };

        Self {
            name: entry.name.clone(),
            client,
            robots: entry.respect_robots.then_some(robots),
            robots_agent: robots_agent.to_string(),
            article_patterns,
            page_param: entry.page_param.clone(),
            max_pages: entry.max_pages.max(1),
            page_delay: Duration::from_millis(entry.page_delay),
        }
    }

    /// Returns the URL of listing page `page` (1-based) for a source
    fn page_url(&self, source: &Url, page: u32) -> Url {
        let Some(param) = self.page_param.as_deref().filter(|_| page > 1) else {
            return source.clone();
        };

        let kept: Vec<(String, String)> = source
            .query_pairs()
            .filter(|(key, _)| key != param)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut url = source.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter())
            .append_pair(param, &page.to_string());
        url
    }

    /// Checks whether a link is an article on the source's site
    fn is_article(&self, site: &str, link: &Url) -> bool {
        let Some(host) = site_host(link) else {
            return false;
        };

        let same_site = host == site
            || (host.len() > site.len()
                && host.ends_with(site)
                && host.as_bytes()[host.len() - site.len() - 1] == b'.');

        same_site
            && self
                .article_patterns
                .iter()
                .any(|pattern| link.as_str().contains(pattern.as_str()))
    }

    async fn load_robots(&self, source: &Url) -> Option<ParsedRobots> {
        match &self.robots {
            Some(cache) => Some(robots_for(&self.client, cache, source).await),
            None => None,
        }
    }
}

#[async_trait]
impl Crawler for HtmlLinkCrawler {
    async fn crawl(&self, source: &Url) -> anyhow::Result<Vec<String>> {
        let Some(site) = site_host(source) else {
            bail!("source {} has no host", source);
        };

        let robots = self.load_robots(source).await;
        let mut delay = self.page_delay;
        if let Some(robots) = &robots {
            if !robots.is_allowed(source.as_str(), &self.robots_agent) {
                bail!("robots.txt disallows {}", source);
            }
            if let Some(crawl_delay) = robots.crawl_delay(&self.robots_agent) {
                delay = delay.max(crawl_delay);
            }
        }

        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for page in 1..=self.max_pages {
            let page_url = self.page_url(source, page);

            if page > 1 {
                if let Some(robots) = &robots {
                    if !robots.is_allowed(page_url.as_str(), &self.robots_agent) {
                        tracing::debug!("[{}] robots.txt disallows {}", self.name, page_url);
                        break;
                    }
                }
                tokio::time::sleep(delay).await;
            }

            let body = match fetch_page(&self.client, &page_url).await {
                Ok(body) => body,
                Err(e) if page == 1 => {
                    return Err(e).with_context(|| format!("[{}] listing page failed", self.name));
                }
                Err(e) => {
                    tracing::debug!("[{}] stopping pagination: {}", self.name, e);
                    break;
                }
            };

            let mut added = 0;
            for link in extract_links(&body, &page_url) {
                if self.is_article(&site, &link) && seen.insert(link.to_string()) {
                    found.push(link.to_string());
                    added += 1;
                }
            }

            tracing::debug!(
                "[{}] page {} ({}): {} new article links",
                self.name,
                page,
                page_url,
                added
            );

            if added == 0 || self.page_param.is_none() {
                break;
            }
        }

        Ok(found)
    }
}
