//! Output module: result persistence and run reporting
//!
//! This module handles:
//! - Category-keyed URL storage (JSON directory or SQLite)
//! - Replace/merge aggregation of crawl results
//! - The per-run report (JSON) and its markdown summary
//! - Statistics over what the store currently holds

mod aggregator;
mod json_store;
mod markdown;
mod report;
mod sqlite_store;
pub mod stats;
mod traits;

pub use aggregator::Aggregator;
pub use json_store::{decode_file_stem, encode_file_stem, JsonDirectoryStore};
pub use markdown::{format_markdown_summary, write_markdown_summary};
pub use report::{
    CategorySummary, PersistStatus, RunReport, SkipReason, SourceOutcome, SourceReport,
};
pub use sqlite_store::SqliteStore;
pub use stats::{load_statistics, print_statistics, StoreStatistics};
pub use traits::{OutputStore, PersistError, PersistMode, PersistOutcome, PersistResult};

use crate::config::{OutputBackend, OutputConfig};
use std::path::Path;

/// Opens the output store selected by the configuration
///
/// # Arguments
///
/// * `config` - The `[output]` section
///
/// # Returns
///
/// * `Ok(Box<dyn OutputStore>)` - The opened store
/// * `Err(PersistError)` - The directory or database could not be opened
pub fn open_store(config: &OutputConfig) -> PersistResult<Box<dyn OutputStore>> {
    match config.backend {
        OutputBackend::Json => {
            let store = JsonDirectoryStore::new(&config.directory)?;
            tracing::info!("Writing category files to {}", store.dir().display());
            Ok(Box::new(store))
        }
        OutputBackend::Sqlite => {
            let path = config
                .database_path
                .as_deref()
                .ok_or_else(|| PersistError::OutputDir("database_path is not set".to_string()))?;
            let store = SqliteStore::open(Path::new(path))?;
            tracing::info!("Writing categories to SQLite database {}", path);
            Ok(Box::new(store))
        }
    }
}
