//! Orchestration driver
//!
//! Walks categories and their sources in configuration order and, for each
//! source, runs Dispatcher → Executor → Aggregator, recording one report
//! entry. Per-source failures never stop the run.
//!
//! Sources are issued from a single loop so dispatch, domain dedup and the
//! category URL target stay deterministic; crawls themselves run on spawned
//! tasks bounded by a semaphore. With the default of one permit the run is
//! strictly sequential.

use crate::config::{Category, Config};
use crate::crawler::{CrawlResult, CrawlStatus, Executor};
use crate::output::{
    Aggregator, OutputStore, PersistMode, PersistStatus, RunReport, SkipReason, SourceReport,
};
use crate::registry::{Registry, RegistryBuilder, ResolveError};
use crate::url::site_host;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default per-invocation crawler timeout
pub const DEFAULT_CRAWL_TIMEOUT: Duration = Duration::from_secs(300);

/// Knobs for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Minimum unique URLs for a crawl to count as a success
    pub min_yield: usize,

    /// Crawl only the first source seen for each domain
    pub dedupe_by_domain: bool,

    /// Maximum number of crawls in flight
    pub max_concurrent_sources: usize,

    /// Upper bound on one crawler invocation
    pub crawl_timeout: Duration,

    pub persist_mode: PersistMode,

    /// Stop issuing a category's sources once it holds this many URLs
    pub max_urls_per_category: Option<usize>,

    /// Only run sources dispatched to these crawlers (empty runs all)
    pub crawler_filter: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            min_yield: 0,
            dedupe_by_domain: false,
            max_concurrent_sources: 1,
            crawl_timeout: DEFAULT_CRAWL_TIMEOUT,
            persist_mode: PersistMode::Replace,
            max_urls_per_category: None,
            crawler_filter: Vec::new(),
        }
    }
}

impl RunOptions {
    /// Builds run options from the `[run]` and `[output]` sections
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_yield: config.run.min_yield,
            dedupe_by_domain: config.run.dedupe_by_domain,
            max_concurrent_sources: config.run.max_concurrent_sources as usize,
            crawl_timeout: Duration::from_secs(config.run.crawl_timeout),
            persist_mode: config.output.mode,
            max_urls_per_category: config.run.max_urls_per_category,
            crawler_filter: Vec::new(),
        }
    }

    /// Restricts the run to the named crawlers
    pub fn with_crawler_filter(mut self, crawlers: Vec<String>) -> Self {
        self.crawler_filter = crawlers;
        self
    }

    /// Whether the crawler filter lets `crawler` run
    pub fn allows_crawler(&self, crawler: &str) -> bool {
        self.crawler_filter.is_empty()
            || self
                .crawler_filter
                .iter()
                .any(|name| name.eq_ignore_ascii_case(crawler))
    }
}

/// A report slot, filled either at issue time or when its crawl finishes
enum Slot {
    Done(SourceReport),
    Pending {
        category: String,
        source: String,
        crawler: String,
        handle: JoinHandle<SourceReport>,
    },
}

/// Results shared by every source in a run that points at the same URL
/// through the same crawler
type ResultCache = HashMap<(String, String), Arc<OnceCell<CrawlResult>>>;

/// Runs categories through the registry, executor and aggregator
pub struct Driver {
    registry: Arc<Registry>,
    executor: Executor,
    options: RunOptions,
}

impl Driver {
    pub fn new(registry: Arc<Registry>, options: RunOptions) -> Self {
        let executor = Executor::new(Arc::clone(&registry), options.crawl_timeout);
        Self {
            registry,
            executor,
            options,
        }
    }

    /// Builds a driver whose registry holds the configured crawlers
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let registry = RegistryBuilder::from_config(config)?;
        Ok(Self::new(Arc::new(registry), RunOptions::from_config(config)))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Runs every source of every category once
    ///
    /// # Arguments
    ///
    /// * `categories` - Categories in run order
    /// * `store` - Output store the aggregator writes to
    /// * `cancel` - Stops issuing new sources when triggered
    ///
    /// # Returns
    ///
    /// A finished [`RunReport`] with one entry per (category, source) pair,
    /// in configuration order. Sources not issued before cancellation are
    /// reported as [`SkipReason::Cancelled`].
    pub async fn run(
        &self,
        categories: &[Category],
        store: Box<dyn OutputStore>,
        cancel: CancellationToken,
    ) -> RunReport {
        let mut report = RunReport::new();
        let aggregator = Arc::new(Mutex::new(Aggregator::new(store, self.options.persist_mode)));
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_sources.max(1)));

        let mut slots: Vec<Slot> = Vec::new();
        let mut seen_domains: HashMap<String, String> = HashMap::new();
        let mut cache: ResultCache = HashMap::new();

        tracing::info!(
            "Starting run: {} categories, minimum yield {}, {} concurrent",
            categories.len(),
            self.options.min_yield,
            self.options.max_concurrent_sources.max(1)
        );
        for name in &self.options.crawler_filter {
            if !self.registry.contains(name) {
                tracing::warn!("Crawler '{}' is not registered", name);
            }
        }

        for category in categories {
            tracing::info!(
                "Category '{}': {} sources",
                category.name,
                category.sources.len()
            );

            for source in &category.sources {
                let source_str = source.url.to_string();
                let skip = |reason| {
                    Slot::Done(SourceReport::skipped(&category.name, &source_str, reason))
                };

                if cancel.is_cancelled() {
                    slots.push(skip(SkipReason::Cancelled));
                    continue;
                }

                if self.options.dedupe_by_domain {
                    if let Some(host) = site_host(&source.url) {
                        if let Some(first) = seen_domains.get(&host) {
                            tracing::info!(
                                "[{}] Skipping {}: domain {} already crawled via {}",
                                category.name,
                                source_str,
                                host,
                                first
                            );
                            slots.push(skip(SkipReason::DuplicateDomain {
                                first_source: first.clone(),
                            }));
                            continue;
                        }
                        seen_domains.insert(host, source_str.clone());
                    }
                }

                let crawler = match self.registry.resolve_source(source) {
                    Ok(name) => name.to_string(),
                    Err(ResolveError::NoCrawlerAvailable { domain }) => {
                        tracing::warn!(
                            "[{}] No crawler available for {} ({})",
                            category.name,
                            source_str,
                            domain
                        );
                        slots.push(skip(SkipReason::NoCrawlerAvailable { domain }));
                        continue;
                    }
                };

                if !self.options.allows_crawler(&crawler) {
                    tracing::debug!(
                        "[{}] Skipping {}: crawler {} not selected",
                        category.name,
                        source_str,
                        crawler
                    );
                    slots.push(skip(SkipReason::CrawlerFiltered { crawler }));
                    continue;
                }

                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
                };
                let Some(permit) = permit else {
                    slots.push(skip(SkipReason::Cancelled));
                    continue;
                };

                // earlier sources of this category have persisted once their permits are back
                if let Some(target) = self.options.max_urls_per_category {
                    let stored = match aggregator.lock().await.stored_count(&category.name) {
                        Ok(stored) => stored,
                        Err(e) => {
                            tracing::warn!(
                                "[{}] Could not count stored URLs: {}",
                                category.name,
                                e
                            );
                            0
                        }
                    };
                    if stored >= target {
                        tracing::info!(
                            "[{}] Skipping {}: category holds {} URLs (target {})",
                            category.name,
                            source_str,
                            stored,
                            target
                        );
                        drop(permit);
                        slots.push(skip(SkipReason::CategoryTargetReached { target }));
                        continue;
                    }
                }

                let key = (source_str.clone(), crawler.clone());
                let reused = cache.contains_key(&key);
                let cell = Arc::clone(cache.entry(key).or_default());

                let executor = self.executor.clone();
                let aggregator = Arc::clone(&aggregator);
                let min_yield = self.options.min_yield;
                let url = source.url.clone();
                let category_name = category.name.clone();
                let task_source = source_str.clone();
                let task_crawler = crawler.clone();

                let handle = tokio::spawn(async move {
                    if reused {
                        tracing::info!(
                            "[{}] Reusing this run's result for {}",
                            category_name,
                            url
                        );
                    }
                    let result = cell
                        .get_or_init(|| executor.execute(&url, &task_crawler, min_yield))
                        .await
                        .clone();

                    let persist = if result.is_persistable() {
                        let mut aggregator = aggregator.lock().await;
                        match aggregator.persist(&category_name, &url, &result) {
                            Ok(Some(outcome)) => PersistStatus::from(outcome),
                            Ok(None) => PersistStatus::NotPersisted,
                            Err(e) => {
                                tracing::warn!(
                                    "[{}] Failed to persist results of {}: {}",
                                    category_name,
                                    url,
                                    e
                                );
                                PersistStatus::Failed {
                                    message: e.to_string(),
                                }
                            }
                        }
                    } else {
                        PersistStatus::NotPersisted
                    };
                    drop(permit);

                    let entry =
                        SourceReport::crawled(&category_name, &task_source, &result, persist);
                    if reused {
                        entry.reused()
                    } else {
                        entry
                    }
                });

                slots.push(Slot::Pending {
                    category: category.name.clone(),
                    source: source_str,
                    crawler,
                    handle,
                });
            }
        }

        for slot in slots {
            let entry = match slot {
                Slot::Done(entry) => entry,
                Slot::Pending {
                    category,
                    source,
                    crawler,
                    handle,
                } => match handle.await {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::error!("[{}] Task for {} failed: {}", category, source, e);
                        let result = CrawlResult {
                            crawler,
                            urls: Vec::new(),
                            status: CrawlStatus::CrawlerError {
                                message: format!("task failed: {}", e),
                            },
                            elapsed: Duration::ZERO,
                        };
                        SourceReport::crawled(&category, &source, &result, PersistStatus::NotPersisted)
                    }
                },
            };
            report.entries.push(entry);
        }

        report.cancelled = cancel.is_cancelled();
        report.finish();
        report.log_summary();
        report
    }
}
