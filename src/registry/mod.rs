//! Crawler registry and dispatcher
//!
//! The registry is a fixed table of crawlers, each bound to one or more
//! [`DomainRule`]s. It is built once at startup through [`RegistryBuilder`]
//! and is read-only afterwards. Resolution is a pure lookup:
//!
//! 1. Extract the source host, lowercase it and strip a leading `www.`
//! 2. Collect every rule that matches the host
//! 3. Pick the most specific rule (longest rule host)
//! 4. Break remaining ties by registration order

mod builder;

pub use builder::{RegistryBuilder, RegistryError};

use crate::config::Source;
use crate::crawler::Crawler;
use crate::url::{site_host, DomainRule};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Resolution failures; never fatal to a run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No registered rule matches the host (or the URL has no host)
    #[error("No crawler available for '{domain}'")]
    NoCrawlerAvailable { domain: String },
}

/// A registered crawler with its domain rules
#[derive(Clone)]
pub struct CrawlerDescriptor {
    pub name: String,
    pub rules: Vec<DomainRule>,
    pub crawler: Arc<dyn Crawler>,
}

impl fmt::Debug for CrawlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlerDescriptor")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

/// Immutable crawler registry
#[derive(Debug, Clone, Default)]
pub struct Registry {
    descriptors: Vec<CrawlerDescriptor>,
}

impl Registry {
    /// Resolves a source URL to the name of the crawler that handles it
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use url::Url;
    /// use url_harvest::crawler::FnCrawler;
    /// use url_harvest::registry::{RegistryBuilder, ResolveError};
    ///
    /// let noop = || Arc::new(FnCrawler::new(|_u: Url| async { Ok(Vec::new()) }));
    /// let registry = RegistryBuilder::new()
    ///     .register("sabay", &["*.sabay.com.kh"], noop())
    ///     .unwrap()
    ///     .register("sabay-news", &["news.sabay.com.kh"], noop())
    ///     .unwrap()
    ///     .build();
    ///
    /// let url = Url::parse("https://news.sabay.com.kh/topics/sport").unwrap();
    /// assert_eq!(registry.resolve(&url), Ok("sabay-news"));
    ///
    /// let url = Url::parse("https://www.sabay.com.kh/").unwrap();
    /// assert_eq!(registry.resolve(&url), Ok("sabay"));
    ///
    /// let url = Url::parse("https://unknown.example/").unwrap();
    /// assert!(matches!(registry.resolve(&url), Err(ResolveError::NoCrawlerAvailable { .. })));
    /// ```
    pub fn resolve(&self, url: &Url) -> Result<&str, ResolveError> {
        let Some(host) = site_host(url) else {
            return Err(ResolveError::NoCrawlerAvailable {
                domain: url.to_string(),
            });
        };

        let mut best: Option<(&CrawlerDescriptor, usize)> = None;
        for descriptor in &self.descriptors {
            for rule in descriptor.rules.iter().filter(|r| r.matches(&host)) {
                let specificity = rule.specificity();
                // strictly greater keeps the earliest registration on ties
                if best.map_or(true, |(_, current)| specificity > current) {
                    best = Some((descriptor, specificity));
                }
            }
        }

        best.map(|(descriptor, _)| descriptor.name.as_str())
            .ok_or(ResolveError::NoCrawlerAvailable { domain: host })
    }

    /// Resolves a configured source
    ///
    /// A tag naming a registered crawler is used as-is; otherwise the
    /// source is resolved by domain.
    pub fn resolve_source(&self, source: &Source) -> Result<&str, ResolveError> {
        if let Some(tag) = source.crawler.as_deref() {
            if let Some(descriptor) = self.get(tag) {
                return Ok(descriptor.name.as_str());
            }
            tracing::debug!(
                "Crawler tag '{}' is not registered, resolving {} by domain",
                tag,
                source.url
            );
        }
        self.resolve(&source.url)
    }

    /// Looks a crawler up by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&CrawlerDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Crawler names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn descriptors(&self) -> &[CrawlerDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FnCrawler;

    fn noop() -> Arc<dyn Crawler> {
        Arc::new(FnCrawler::new(|_source: Url| async move {
            Ok(Vec::new())
        }))
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn registry() -> Registry {
        RegistryBuilder::new()
            .register("btv", &["btv.com.kh"], noop())
            .unwrap()
            .register("rfa", &["*.rfa.org"], noop())
            .unwrap()
            .register("postkhmer", &["postkhmer.com", "*.postkhmer.com"], noop())
            .unwrap()
            .build()
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let registry = registry();
        let source = url("https://btv.com.kh/category/sport");
        let first = registry.resolve(&source).unwrap();
        for _ in 0..10 {
            assert_eq!(registry.resolve(&source).unwrap(), first);
        }
        assert_eq!(first, "btv");
    }

    #[test]
    fn test_resolve_ignores_case_and_www() {
        let registry = registry();
        assert_eq!(registry.resolve(&url("https://WWW.BTV.com.kh/")), Ok("btv"));
        assert_eq!(registry.resolve(&url("https://www.rfa.org/khmer")), Ok("rfa"));
        assert_eq!(
            registry.resolve(&url("https://news.postkhmer.com/x")),
            Ok("postkhmer")
        );
    }

    #[test]
    fn test_exact_rule_does_not_match_subdomain() {
        let registry = registry();
        assert_eq!(
            registry.resolve(&url("https://news.btv.com.kh/")),
            Err(ResolveError::NoCrawlerAvailable {
                domain: "news.btv.com.kh".to_string()
            })
        );
    }

    #[test]
    fn test_unmatched_domain() {
        let registry = registry();
        let result = registry.resolve(&url("http://b.example/rss"));
        assert_eq!(
            result,
            Err(ResolveError::NoCrawlerAvailable {
                domain: "b.example".to_string()
            })
        );
    }

    #[test]
    fn test_url_without_host() {
        let registry = registry();
        assert!(matches!(
            registry.resolve(&url("data:text/plain,hello")),
            Err(ResolveError::NoCrawlerAvailable { .. })
        ));
    }

    #[test]
    fn test_empty_registry_never_panics() {
        let registry = Registry::default();
        assert!(registry.is_empty());
        assert!(registry.resolve(&url("https://btv.com.kh/")).is_err());
    }

    #[test]
    fn test_longest_rule_wins() {
        let registry = RegistryBuilder::new()
            .register("a", &["*.example.com"], noop())
            .unwrap()
            .register("b", &["news.example.com"], noop())
            .unwrap()
            .build();

        assert_eq!(registry.resolve(&url("https://news.example.com/")), Ok("b"));
        assert_eq!(registry.resolve(&url("https://sport.example.com/")), Ok("a"));
        assert_eq!(registry.resolve(&url("https://example.com/")), Ok("a"));
    }

    #[test]
    fn test_identical_rules_go_to_first_registered() {
        let registry = RegistryBuilder::new()
            .register("first", &["example.com"], noop())
            .unwrap()
            .register("second", &["*.example.com"], noop())
            .unwrap()
            .register("third", &["example.com"], noop())
            .unwrap()
            .build();

        assert_eq!(registry.resolve(&url("https://example.com/")), Ok("first"));
    }

    #[test]
    fn test_resolve_source_prefers_registered_tag() {
        let registry = registry();

        let tagged = Source::tagged(url("https://btv.com.kh/category/sport"), "RFA");
        assert_eq!(registry.resolve_source(&tagged), Ok("rfa"));

        let unknown_tag = Source::tagged(url("https://btv.com.kh/category/sport"), "btv-old");
        assert_eq!(registry.resolve_source(&unknown_tag), Ok("btv"));

        let untagged = Source::new(url("https://www.rfa.org/khmer/news"));
        assert_eq!(registry.resolve_source(&untagged), Ok("rfa"));
    }

    #[test]
    fn test_get_and_names() {
        let registry = registry();
        assert_eq!(registry.names(), vec!["btv", "rfa", "postkhmer"]);
        assert!(registry.contains("BTV"));
        assert!(!registry.contains("sabay"));
        assert_eq!(registry.get("PostKhmer").unwrap().rules.len(), 2);
        assert_eq!(registry.len(), 3);
    }
}
