//! Result aggregation and persistence
//!
//! The aggregator owns the output store for the duration of a run and
//! applies the persist mode: it decides whether a write replaces or merges
//! with what the store holds for the category.

use crate::crawler::{dedupe_preserving_order, CrawlResult};
use crate::output::traits::{OutputStore, PersistMode, PersistOutcome, PersistResult};
use std::collections::HashSet;
use url::Url;

/// Writes crawl results to category-scoped records
pub struct Aggregator {
    store: Box<dyn OutputStore>,
    mode: PersistMode,
    written: HashSet<String>,
}

impl Aggregator {
    pub fn new(store: Box<dyn OutputStore>, mode: PersistMode) -> Self {
        Self {
            store,
            mode,
            written: HashSet::new(),
        }
    }

    pub fn mode(&self) -> PersistMode {
        self.mode
    }

    pub fn store(&self) -> &dyn OutputStore {
        self.store.as_ref()
    }

    /// Number of URLs the category will hold before this run's next write
    ///
    /// In replace mode a record left by a previous run does not count until
    /// this run has written the category.
    pub fn stored_count(&self, category: &str) -> PersistResult<usize> {
        if self.mode == PersistMode::Merge || self.written.contains(category) {
            Ok(self.store.load(category)?.len())
        } else {
            Ok(0)
        }
    }

    /// Persists a crawl result under `category`
    ///
    /// `CrawlerError` results are not written and yield `Ok(None)`. Merging
    /// concatenates stored and new URLs and deduplicates preserving order, so
    /// persisting the same result twice leaves the record unchanged.
    ///
    /// # Arguments
    ///
    /// * `category` - Category the source belongs to
    /// * `source` - The source URL that was crawled (for logging)
    /// * `result` - The executor's result
    ///
    /// # Returns
    ///
    /// * `Ok(Some(PersistOutcome))` - The record was written
    /// * `Ok(None)` - The result carries nothing to persist
    /// * `Err(PersistError)` - Reading or writing the store failed
    pub fn persist(
        &mut self,
        category: &str,
        source: &Url,
        result: &CrawlResult,
    ) -> PersistResult<Option<PersistOutcome>> {
        if !result.is_persistable() {
            return Ok(None);
        }

        let merge = self.mode == PersistMode::Merge || self.written.contains(category);
        let existing = if merge {
            self.store.load(category)?
        } else {
            Vec::new()
        };

        let before = dedupe_preserving_order(&existing).len();
        let merged = dedupe_preserving_order(existing.iter().chain(result.urls.iter()));
        let added = merged.len().saturating_sub(before);

        self.store.save(category, &merged)?;
        self.written.insert(category.to_string());

        let location = self.store.location(category);
        tracing::info!(
            "[{}] {} -> {} (+{} new, {} total)",
            category,
            source,
            location,
            added,
            merged.len()
        );

        Ok(Some(PersistOutcome {
            category: category.to_string(),
            location,
            total: merged.len(),
            added,
        }))
    }
}
