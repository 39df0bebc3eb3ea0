//! Configuration module for url-harvest
//!
//! This module handles the TOML run configuration (crawler registry entries,
//! output store, run behavior) and the JSON categories document.
//!
//! # Example
//!
//! ```no_run
//! use url_harvest::config::{load_categories, load_config};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! let categories = load_categories(Path::new(&config.run.categories_file)).unwrap();
//! println!("{} categories, minimum yield {}", categories.len(), config.run.min_yield);
//! ```

mod categories;
mod parser;
mod types;
mod validation;

pub use categories::{
    load_categories, load_categories_with_hash, parse_categories, select_categories, Category,
    Source,
};
pub use types::{Config, CrawlerEntry, OutputBackend, OutputConfig, RunConfig, UserAgentConfig};

pub use parser::{compute_config_hash, load_config, parse_config};

pub(crate) use validation::validate_domain_pattern;
pub use validation::validate_category_outputs;
