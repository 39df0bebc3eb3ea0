//! Crawl executor
//!
//! Runs one crawler against one source with uniform guarantees: the crawl is
//! isolated in its own task, bounded by a timeout, and its output is
//! deduplicated and checked against the minimum yield. Nothing a crawler does
//! can propagate out of [`Executor::execute`].

use crate::registry::Registry;
use serde::Serialize;
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Outcome classification of one crawl invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrawlStatus {
    /// Yield met the minimum
    Success,
    /// Crawl completed but produced fewer unique URLs than required
    BelowMinimumYield { required: usize },
    /// Crawler failed, panicked, timed out or is not registered
    CrawlerError { message: String },
}

/// Result of running one crawler against one source
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Name of the crawler that ran
    pub crawler: String,

    /// Unique URLs in first-seen order (empty on `CrawlerError`)
    pub urls: Vec<String>,

    pub status: CrawlStatus,

    /// Wall-clock time spent in the crawler
    pub elapsed: Duration,
}

impl CrawlResult {
    /// Number of unique URLs produced
    pub fn count(&self) -> usize {
        self.urls.len()
    }

    pub fn is_success(&self) -> bool {
        self.status == CrawlStatus::Success
    }

    /// Whether the result carries URLs that should be persisted
    pub fn is_persistable(&self) -> bool {
        !matches!(self.status, CrawlStatus::CrawlerError { .. })
    }

    fn error(crawler: &str, message: String, elapsed: Duration) -> Self {
        Self {
            crawler: crawler.to_string(),
            urls: Vec::new(),
            status: CrawlStatus::CrawlerError { message },
            elapsed,
        }
    }
}

/// Invokes registered crawlers
#[derive(Clone)]
pub struct Executor {
    registry: Arc<Registry>,
    timeout: Duration,
}

impl Executor {
    /// Creates an executor
    ///
    /// # Arguments
    ///
    /// * `registry` - Registry the crawler names are looked up in
    /// * `timeout` - Upper bound on a single crawl invocation
    pub fn new(registry: Arc<Registry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `crawler_name` against `url`
    ///
    /// The crawler is never retried here. Errors, panics and timeouts all
    /// become [`CrawlStatus::CrawlerError`] with an empty URL list; a short
    /// but successful crawl becomes [`CrawlStatus::BelowMinimumYield`] and
    /// keeps its URLs.
    pub async fn execute(&self, url: &Url, crawler_name: &str, min_yield: usize) -> CrawlResult {
        let start = Instant::now();

        let Some(descriptor) = self.registry.get(crawler_name) else {
            return CrawlResult::error(
                crawler_name,
                format!("Crawler '{}' is not registered", crawler_name),
                start.elapsed(),
            );
        };

        let name = descriptor.name.clone();
        let crawler = Arc::clone(&descriptor.crawler);
        let source = url.clone();

        tracing::info!("[{}] Crawling {}", name, url);

        let mut handle = tokio::spawn(async move { crawler.crawl(&source).await });

        let outcome = match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(Ok(urls))) => Ok(urls),
            Ok(Ok(Err(e))) => Err(format!("{:#}", e)),
            Ok(Err(join_error)) if join_error.is_panic() => Err(format!(
                "crawler panicked: {}",
                panic_message(join_error.into_panic())
            )),
            Ok(Err(join_error)) => Err(format!("crawler task failed: {}", join_error)),
            Err(_) => {
                handle.abort();
                Err(format!(
                    "crawler timed out after {:.1}s",
                    self.timeout.as_secs_f64()
                ))
            }
        };

        let elapsed = start.elapsed();

        let raw = match outcome {
            Ok(raw) => raw,
            Err(message) => {
                tracing::error!("[{}] {} failed: {}", name, url, message);
                return CrawlResult::error(&name, message, elapsed);
            }
        };

        let urls = dedupe_preserving_order(raw);
        let status = if urls.len() >= min_yield {
            tracing::info!(
                "[{}] {} yielded {} URLs in {:.1}s",
                name,
                url,
                urls.len(),
                elapsed.as_secs_f64()
            );
            CrawlStatus::Success
        } else {
            tracing::warn!(
                "[{}] {} yielded {} URLs, below the minimum of {}",
                name,
                url,
                urls.len(),
                min_yield
            );
            CrawlStatus::BelowMinimumYield {
                required: min_yield,
            }
        };

        CrawlResult {
            crawler: name,
            urls,
            status,
            elapsed,
        }
    }
}

/// Deduplicates URLs keeping the first occurrence of each
///
/// Entries are trimmed; empty entries are dropped.
///
/// ```
/// use url_harvest::crawler::dedupe_preserving_order;
///
/// let urls = vec!["a".to_string(), "b".to_string(), "a".to_string(), "c".to_string()];
/// assert_eq!(dedupe_preserving_order(urls), vec!["a", "b", "c"]);
/// ```
pub fn dedupe_preserving_order<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for url in urls {
        let url = url.as_ref().trim();
        if url.is_empty() {
            continue;
        }
        if seen.insert(url.to_string()) {
            unique.push(url.to_string());
        }
    }

    unique
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{Crawler, FnCrawler};
    use crate::registry::RegistryBuilder;
    use async_trait::async_trait;

    struct SlowCrawler;

    #[async_trait]
    impl Crawler for SlowCrawler {
        async fn crawl(&self, _source: &Url) -> anyhow::Result<Vec<String>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec!["https://slow.example/article/1".to_string()])
        }
    }

    struct PanickingCrawler;

    #[async_trait]
    impl Crawler for PanickingCrawler {
        async fn crawl(&self, _source: &Url) -> anyhow::Result<Vec<String>> {
            panic!("selector not found");
        }
    }

    fn executor(timeout: Duration) -> Executor {
        let registry = RegistryBuilder::new()
            .register(
                "fixed",
                &["a.example"],
                Arc::new(FnCrawler::new(|_source: Url| async move {
                    Ok(vec![
                        "u1".to_string(),
                        "u2".to_string(),
                        " u1 ".to_string(),
                        "".to_string(),
                        "u3".to_string(),
                    ])
                })),
            )
            .unwrap()
            .register(
                "broken",
                &["b.example"],
                Arc::new(FnCrawler::new(|_source: Url| async move {
                    Err::<Vec<String>, _>(anyhow::anyhow!("connection reset"))
                })),
            )
            .unwrap()
            .register("slow", &["slow.example"], Arc::new(SlowCrawler))
            .unwrap()
            .register("panics", &["panic.example"], Arc::new(PanickingCrawler))
            .unwrap()
            .build();
        Executor::new(Arc::new(registry), timeout)
    }

    fn source() -> Url {
        Url::parse("http://a.example/rss").unwrap()
    }

    #[test]
    fn test_dedupe_preserving_order() {
        assert_eq!(
            dedupe_preserving_order(["a", "b", "a", "c"]),
            vec!["a", "b", "c"]
        );
        assert!(dedupe_preserving_order(Vec::<String>::new()).is_empty());
    }

    #[tokio::test]
    async fn test_success_dedupes_output() {
        let result = executor(Duration::from_secs(5))
            .execute(&source(), "fixed", 2)
            .await;

        assert_eq!(result.crawler, "fixed");
        assert_eq!(result.urls, vec!["u1", "u2", "u3"]);
        assert_eq!(result.count(), 3);
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_below_minimum_yield_keeps_urls() {
        let result = executor(Duration::from_secs(5))
            .execute(&source(), "fixed", 10)
            .await;

        assert_eq!(
            result.status,
            CrawlStatus::BelowMinimumYield { required: 10 }
        );
        assert_eq!(result.urls, vec!["u1", "u2", "u3"]);
        assert!(result.is_persistable());
    }

    #[tokio::test]
    async fn test_crawler_error_is_contained() {
        let result = executor(Duration::from_secs(5))
            .execute(&source(), "broken", 0)
            .await;

        assert!(result.urls.is_empty());
        assert!(!result.is_persistable());
        match result.status {
            CrawlStatus::CrawlerError { message } => assert!(message.contains("connection reset")),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let result = executor(Duration::from_secs(5))
            .execute(&source(), "panics", 0)
            .await;

        match result.status {
            CrawlStatus::CrawlerError { message } => {
                assert!(message.contains("selector not found"))
            }
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_becomes_crawler_error() {
        let result = executor(Duration::from_millis(100))
            .execute(&source(), "slow", 0)
            .await;

        assert!(result.urls.is_empty());
        match result.status {
            CrawlStatus::CrawlerError { message } => assert!(message.contains("timed out")),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_crawler_is_crawler_error() {
        let result = executor(Duration::from_secs(5))
            .execute(&source(), "missing", 0)
            .await;

        assert_eq!(result.crawler, "missing");
        assert!(matches!(result.status, CrawlStatus::CrawlerError { .. }));
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let result = executor(Duration::from_secs(5))
            .execute(&source(), "FIXED", 0)
            .await;

        assert_eq!(result.crawler, "fixed");
        assert!(result.is_success());
    }
}
