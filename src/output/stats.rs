//! Statistics over an output store
//!
//! Backs the `--stats` CLI flag: what each category currently holds.

use crate::output::traits::{OutputStore, PersistResult};
use std::collections::HashSet;
use url::Url;

/// Output store statistics summary
#[derive(Debug, Clone, Default)]
pub struct StoreStatistics {
    /// (category, stored URL count) in store order
    pub categories: Vec<(String, usize)>,

    /// Total URLs across categories
    pub total_urls: usize,

    /// Distinct hosts across all stored URLs
    pub unique_domains: usize,
}

/// Loads statistics from an output store
pub fn load_statistics(store: &dyn OutputStore) -> PersistResult<StoreStatistics> {
    let mut stats = StoreStatistics::default();
    let mut domains = HashSet::new();

    for category in store.categories()? {
        let urls = store.load(&category)?;
        for url in &urls {
            if let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase)) {
                domains.insert(host);
            }
        }
        stats.total_urls += urls.len();
        stats.categories.push((category, urls.len()));
    }

    stats.unique_domains = domains.len();
    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Output Store Statistics ===\n");

    println!("Overview:");
    println!("  Categories: {}", stats.categories.len());
    println!("  Total URLs: {}", stats.total_urls);
    println!("  Unique domains: {}", stats.unique_domains);
    println!();

    println!("URLs by Category:");
    let mut counts: Vec<_> = stats.categories.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    for (category, count) in counts {
        let percentage = if stats.total_urls > 0 {
            (*count as f64 / stats.total_urls as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", category, count, percentage);
    }
}
