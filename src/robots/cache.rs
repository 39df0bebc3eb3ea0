//! Robots.txt caching implementation
//!
//! Entries are keyed by origin (`scheme://host:port`) and expire after
//! 24 hours.

use crate::robots::ParsedRobots;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Cached robots.txt data for one origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt content
    pub content: ParsedRobots,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Creates a new entry stamped with the current time
    pub fn new(content: ParsedRobots) -> Self {
        Self {
            content,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the entry is older than 24 hours
    pub fn is_stale(&self) -> bool {
        Utc::now() - self.fetched_at > Duration::hours(24)
    }
}

/// Shared robots.txt cache used by every crawler built from one config
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: RwLock<HashMap<String, CachedRobots>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fresh entry for an origin, if any
    pub async fn get(&self, origin: &str) -> Option<ParsedRobots> {
        let entries = self.entries.read().await;
        entries
            .get(origin)
            .filter(|cached| !cached.is_stale())
            .map(|cached| cached.content.clone())
    }

    /// Stores (or refreshes) the entry for an origin
    pub async fn insert(&self, origin: &str, robots: ParsedRobots) {
        let mut entries = self.entries.write().await;
        entries.insert(origin.to_string(), CachedRobots::new(robots));
    }

    /// Number of cached origins, stale ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    #[cfg(test)]
    async fn insert_entry(&self, origin: &str, entry: CachedRobots) {
        self.entries.write().await.insert(origin.to_string(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_not_stale() {
        let cached = CachedRobots::new(ParsedRobots::allow_all());
        assert!(!cached.is_stale());
    }

    #[test]
    fn test_entry_stale_after_a_day() {
        let mut cached = CachedRobots::new(ParsedRobots::allow_all());
        cached.fetched_at = Utc::now() - Duration::hours(25);
        assert!(cached.is_stale());

        cached.fetched_at = Utc::now() - Duration::hours(23);
        assert!(!cached.is_stale());
    }

    #[tokio::test]
    async fn test_cache_round_trip() {
        let cache = RobotsCache::new();
        assert!(cache.is_empty().await);
        assert!(cache.get("https://example.com").await.is_none());

        cache
            .insert(
                "https://example.com",
                ParsedRobots::from_content("User-agent: *\nDisallow: /private"),
            )
            .await;

        let robots = cache.get("https://example.com").await.unwrap();
        assert!(!robots.is_allowed("https://example.com/private", "TestBot"));
        assert!(cache.get("https://other.example.com").await.is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_stale_entry_is_not_returned() {
        let cache = RobotsCache::new();
        let mut entry = CachedRobots::new(ParsedRobots::allow_all());
        entry.fetched_at = Utc::now() - Duration::hours(30);
        cache.insert_entry("https://example.com", entry).await;

        assert!(cache.get("https://example.com").await.is_none());
    }
}
