//! Run report
//!
//! Every (category, source) pair processed by a run gets exactly one entry
//! recording what happened to it. The report is the only place per-source
//! failures surface.

use crate::crawler::{CrawlResult, CrawlStatus};
use crate::output::json_store::write_atomic;
use crate::output::traits::{PersistOutcome, PersistResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Why a source was not crawled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// No registered crawler handles the source's domain
    NoCrawlerAvailable { domain: String },
    /// An earlier source in the run already covered this domain
    DuplicateDomain { first_source: String },
    /// The run was cancelled before the source was issued
    Cancelled,
    /// The category already held its URL target
    CategoryTargetReached { target: usize },
    /// The resolved crawler is not among the crawlers selected for the run
    CrawlerFiltered { crawler: String },
}

impl SkipReason {
    /// Whether the skip was requested by the run's own limits rather than
    /// caused by a problem with the source
    pub fn is_intentional(&self) -> bool {
        matches!(
            self,
            SkipReason::CategoryTargetReached { .. } | SkipReason::CrawlerFiltered { .. }
        )
    }
}

/// What happened when writing a crawl result to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PersistStatus {
    Persisted {
        location: String,
        total: usize,
        added: usize,
    },
    /// Nothing was written (crawler errors are discarded)
    NotPersisted,
    Failed {
        message: String,
    },
}

impl From<PersistOutcome> for PersistStatus {
    fn from(outcome: PersistOutcome) -> Self {
        PersistStatus::Persisted {
            location: outcome.location,
            total: outcome.total,
            added: outcome.added,
        }
    }
}

/// Outcome of one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SourceOutcome {
    Crawled {
        crawler: String,
        status: CrawlStatus,
        yield_count: usize,
        elapsed_ms: u64,
        /// The result was taken from an earlier crawl of the same source in this run
        reused: bool,
        persist: PersistStatus,
    },
    Skipped(SkipReason),
}

/// Report entry for one (category, source) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub category: String,
    pub source: String,
    pub outcome: SourceOutcome,
}

impl SourceReport {
    pub fn crawled(category: &str, source: &str, result: &CrawlResult, persist: PersistStatus) -> Self {
        Self {
            category: category.to_string(),
            source: source.to_string(),
            outcome: SourceOutcome::Crawled {
                crawler: result.crawler.clone(),
                status: result.status.clone(),
                yield_count: result.count(),
                elapsed_ms: result.elapsed.as_millis() as u64,
                reused: false,
                persist,
            },
        }
    }

    /// Marks a crawled entry as served from the run's result cache
    pub fn reused(mut self) -> Self {
        if let SourceOutcome::Crawled { reused, .. } = &mut self.outcome {
            *reused = true;
        }
        self
    }

    pub fn is_reused(&self) -> bool {
        matches!(self.outcome, SourceOutcome::Crawled { reused: true, .. })
    }

    pub fn skipped(category: &str, source: &str, reason: SkipReason) -> Self {
        Self {
            category: category.to_string(),
            source: source.to_string(),
            outcome: SourceOutcome::Skipped(reason),
        }
    }

    /// The crawl status, if the source was crawled
    pub fn status(&self) -> Option<&CrawlStatus> {
        match &self.outcome {
            SourceOutcome::Crawled { status, .. } => Some(status),
            SourceOutcome::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match &self.outcome {
            SourceOutcome::Skipped(reason) => Some(reason),
            SourceOutcome::Crawled { .. } => None,
        }
    }

    pub fn yield_count(&self) -> usize {
        match &self.outcome {
            SourceOutcome::Crawled { yield_count, .. } => *yield_count,
            SourceOutcome::Skipped(_) => 0,
        }
    }
}

/// Per-category tallies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub sources: usize,
    pub succeeded: usize,
    pub below_minimum: usize,
    pub errors: usize,
    pub skipped: usize,
    pub persist_failures: usize,
    pub urls_collected: usize,
    /// Size of the stored record after the run's last write, if any
    pub urls_stored: Option<usize>,
}

/// Record of one full pass over the configured categories
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// SHA-256 of the categories document the run was driven by
    pub categories_hash: Option<String>,

    pub cancelled: bool,
    pub entries: Vec<SourceReport>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            categories_hash: None,
            cancelled: false,
            entries: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Run duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    /// Looks up the entry for a (category, source) pair
    pub fn entry(&self, category: &str, source: &str) -> Option<&SourceReport> {
        self.entries
            .iter()
            .find(|e| e.category == category && e.source == source)
    }

    /// Per-category tallies in first-seen category order
    pub fn summaries(&self) -> Vec<CategorySummary> {
        let mut summaries: Vec<CategorySummary> = Vec::new();

        for entry in &self.entries {
            let index = match summaries.iter().position(|s| s.category == entry.category) {
                Some(index) => index,
                None => {
                    summaries.push(CategorySummary {
                        category: entry.category.clone(),
                        ..CategorySummary::default()
                    });
                    summaries.len() - 1
                }
            };
            let summary = &mut summaries[index];
            summary.sources += 1;

            match &entry.outcome {
                SourceOutcome::Skipped(_) => summary.skipped += 1,
                SourceOutcome::Crawled {
                    status,
                    yield_count,
                    persist,
                    ..
                } => {
                    match status {
                        CrawlStatus::Success => summary.succeeded += 1,
                        CrawlStatus::BelowMinimumYield { .. } => summary.below_minimum += 1,
                        CrawlStatus::CrawlerError { .. } => summary.errors += 1,
                    }
                    summary.urls_collected += yield_count;
                    match persist {
                        PersistStatus::Persisted { total, .. } => {
                            summary.urls_stored = Some(summary.urls_stored.unwrap_or(0).max(*total))
                        }
                        PersistStatus::Failed { .. } => summary.persist_failures += 1,
                        PersistStatus::NotPersisted => {}
                    }
                }
            }
        }

        summaries
    }

    /// Entries that did not end in a clean success
    ///
    /// Skips caused by the category target or the crawler filter are not
    /// failures.
    pub fn failures(&self) -> impl Iterator<Item = &SourceReport> {
        self.entries.iter().filter(|e| match &e.outcome {
            SourceOutcome::Crawled {
                status: CrawlStatus::Success,
                persist: PersistStatus::Persisted { .. },
                ..
            } => false,
            SourceOutcome::Skipped(reason) => !reason.is_intentional(),
            SourceOutcome::Crawled { .. } => true,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the report as pretty JSON, atomically
    pub fn write_json(&self, path: &Path) -> PersistResult<()> {
        write_atomic(path, &self.to_json()?)
    }

    /// Logs one line per category plus run totals
    pub fn log_summary(&self) {
        for summary in self.summaries() {
            tracing::info!(
                "[{}] {} sources: {} ok, {} below minimum, {} errors, {} skipped; {} URLs collected",
                summary.category,
                summary.sources,
                summary.succeeded,
                summary.below_minimum,
                summary.errors,
                summary.skipped,
                summary.urls_collected
            );
        }

        let failures = self.failures().count();
        if self.cancelled {
            tracing::warn!(
                "Run cancelled: {} sources recorded, {} not clean",
                self.entries.len(),
                failures
            );
        } else {
            tracing::info!(
                "Run finished: {} sources, {} not clean",
                self.entries.len(),
                failures
            );
        }
    }
}
