//! Category source store
//!
//! Loads the JSON document mapping editorial categories to their sources.
//! Each category accepts one of two shapes:
//!
//! ```json
//! {
//!   "sport": { "btv": "https://btv.com.kh/category/sport", "rfa": "https://www.rfa.org/khmer/sport" },
//!   "politics": ["https://dap-news.com/politic", "https://www.postkhmer.com/politics"]
//! }
//! ```
//!
//! The keyed shape tags every source with a crawler name; the list shape
//! leaves the crawler to be resolved from the URL's domain.

use crate::config::parser::compute_config_hash;
use crate::ConfigError;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use url::Url;

/// One configured URL to crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// The source listing URL
    pub url: Url,

    /// Explicit crawler name (keyed form only)
    pub crawler: Option<String>,
}

impl Source {
    /// Creates an untagged source
    pub fn new(url: Url) -> Self {
        Self { url, crawler: None }
    }

    /// Creates a source tagged with an explicit crawler name
    pub fn tagged(url: Url, crawler: impl Into<String>) -> Self {
        Self {
            url,
            crawler: Some(crawler.into()),
        }
    }
}

/// An editorial grouping of sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub sources: Vec<Source>,
}

/// Per-category sources as they appear in the document
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSources {
    Keyed(OrderedMap<String>),
    List(Vec<String>),
}

/// A JSON object deserialized in document order, rejecting duplicate keys
struct OrderedMap<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, V)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    if entries.iter().any(|(existing, _)| *existing == key) {
                        return Err(de::Error::custom(format!("duplicate key '{}'", key)));
                    }
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// Loads categories from a JSON document on disk
///
/// # Arguments
///
/// * `path` - Path to the categories document
///
/// # Returns
///
/// * `Ok(Vec<Category>)` - Categories in document order
/// * `Err(ConfigError)` - The file is unreadable, malformed, or holds an invalid source
pub fn load_categories(path: &Path) -> Result<Vec<Category>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let categories = parse_categories(&content)?;

    for category in &categories {
        tracing::info!(
            "Category '{}': {} sources",
            category.name,
            category.sources.len()
        );
        for source in category.sources.iter().take(3) {
            tracing::debug!("  - {}", source.url);
        }
    }

    Ok(categories)
}

/// Loads categories and returns the document's SHA-256 fingerprint alongside them
pub fn load_categories_with_hash(path: &Path) -> Result<(Vec<Category>, String), ConfigError> {
    let categories = load_categories(path)?;
    let hash = compute_config_hash(path)?;
    Ok((categories, hash))
}

/// Parses a categories document
pub fn parse_categories(content: &str) -> Result<Vec<Category>, ConfigError> {
    let document: OrderedMap<RawSources> = serde_json::from_str(content)?;

    document
        .0
        .into_iter()
        .map(|(name, raw)| build_category(name, raw))
        .collect()
}

fn build_category(name: String, raw: RawSources) -> Result<Category, ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "Category name cannot be empty".to_string(),
        ));
    }

    let sources = match raw {
        RawSources::Keyed(entries) => entries
            .0
            .into_iter()
            .map(|(crawler, url)| Ok(Source::tagged(parse_source_url(&name, &url)?, crawler)))
            .collect::<Result<Vec<_>, ConfigError>>()?,
        RawSources::List(urls) => urls
            .iter()
            .map(|url| Ok(Source::new(parse_source_url(&name, url)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?,
    };

    Ok(Category { name, sources })
}

fn parse_source_url(category: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid source URL '{}' in category '{}': {}",
            raw, category, e
        ))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Source URL '{}' in category '{}' must use http or https",
            raw, category
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Source URL '{}' in category '{}' has no host",
            raw, category
        )));
    }

    Ok(url)
}

/// Narrows the categories to the requested names, keeping document order
///
/// An empty filter selects every category. Names that match nothing are logged
/// and ignored.
pub fn select_categories(categories: Vec<Category>, filter: &[String]) -> Vec<Category> {
    if filter.is_empty() {
        return categories;
    }

    for wanted in filter {
        if !categories.iter().any(|c| &c.name == wanted) {
            tracing::warn!("Category '{}' is not in the categories document", wanted);
        }
    }

    categories
        .into_iter()
        .filter(|c| filter.contains(&c.name))
        .collect()
}
