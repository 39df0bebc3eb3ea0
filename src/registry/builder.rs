use crate::config::Config;
use crate::crawler::{build_http_client, Crawler, HtmlLinkCrawler};
use crate::registry::{CrawlerDescriptor, Registry};
use crate::robots::RobotsCache;
use crate::url::DomainRule;
use crate::ConfigError;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while assembling the registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Crawler '{0}' is registered twice")]
    DuplicateName(String),

    #[error("Crawler '{0}' has no domain rules")]
    NoRules(String),

    #[error("Crawler '{crawler}' has an invalid domain rule: {source}")]
    InvalidRule {
        crawler: String,
        #[source]
        source: ConfigError,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Collects crawler descriptors before freezing them into a [`Registry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    descriptors: Vec<CrawlerDescriptor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a crawler under one or more domain patterns
    ///
    /// # Arguments
    ///
    /// * `name` - Unique crawler name (compared case-insensitively)
    /// * `patterns` - Domain patterns, `example.com` or `*.example.com`
    /// * `crawler` - The crawl capability
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - The builder with the crawler added
    /// * `Err(RegistryError)` - Duplicate name, no patterns, or an invalid pattern
    pub fn register<S: AsRef<str>>(
        mut self,
        name: &str,
        patterns: &[S],
        crawler: Arc<dyn Crawler>,
    ) -> Result<Self, RegistryError> {
        let name = name.trim();

        if self
            .descriptors
            .iter()
            .any(|d| d.name.eq_ignore_ascii_case(name))
        {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }

        if patterns.is_empty() {
            return Err(RegistryError::NoRules(name.to_string()));
        }

        let mut rules = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let rule = DomainRule::parse(pattern.as_ref()).map_err(|source| {
                RegistryError::InvalidRule {
                    crawler: name.to_string(),
                    source,
                }
            })?;

            if let Some(owner) = self
                .descriptors
                .iter()
                .find(|d| d.rules.contains(&rule))
            {
                tracing::warn!(
                    "Domain rule '{}' of crawler '{}' is already registered by '{}'; '{}' keeps it",
                    rule,
                    name,
                    owner.name,
                    owner.name
                );
            }

            if !rules.contains(&rule) {
                rules.push(rule);
            }
        }

        self.descriptors.push(CrawlerDescriptor {
            name: name.to_string(),
            rules,
            crawler,
        });

        Ok(self)
    }

    /// Freezes the registry
    pub fn build(self) -> Registry {
        Registry {
            descriptors: self.descriptors,
        }
    }

    /// Builds a registry with one [`HtmlLinkCrawler`] per `[[crawler]]` entry
    ///
    /// All crawlers share one HTTP client and one robots.txt cache.
    pub fn from_config(config: &Config) -> Result<Registry, RegistryError> {
        let client = build_http_client(&config.user_agent)?;
        let robots = Arc::new(RobotsCache::new());

        let mut builder = RegistryBuilder::new();
        for entry in &config.crawlers {
            let crawler = HtmlLinkCrawler::from_entry(
                entry,
                client.clone(),
                Arc::clone(&robots),
                &config.user_agent.crawler_name,
            );
            builder = builder.register(&entry.name, entry.domains.as_slice(), Arc::new(crawler))?;
            tracing::debug!(
                "Registered crawler '{}' for {}",
                entry.name,
                entry.domains.join(", ")
            );
        }

        let registry = builder.build();
        tracing::info!("Registered {} crawlers", registry.len());
        Ok(registry)
    }
}
