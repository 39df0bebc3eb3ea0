//! url-harvest: category-driven article URL collection
//!
//! This crate resolves configured news sources to site-specific crawlers,
//! runs each crawler with uniform yield and isolation guarantees, and
//! persists the collected article URLs per editorial category.

pub mod config;
pub mod crawler;
pub mod driver;
pub mod output;
pub mod registry;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for url-harvest operations
///
/// Only failures that make a run impossible surface here. Per-source
/// problems are recorded in the [`output::RunReport`] instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] registry::RegistryError),

    #[error("Output store error: {0}")]
    Persist(#[from] output::PersistError),
}

/// Configuration-specific errors
///
/// Every variant is fatal: a run never starts on a configuration that
/// failed to load.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse categories document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for url-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::{load_categories, Category, Config, Source};
pub use crawler::{CrawlResult, CrawlStatus, Crawler, Executor, FnCrawler};
pub use driver::{Driver, RunOptions};
pub use output::{Aggregator, OutputStore, PersistMode, RunReport};
pub use registry::{Registry, RegistryBuilder, ResolveError};
pub use crate::url::{extract_domain, normalize_url, DomainRule};
