//! Output store trait and associated types
//!
//! An output store holds one ordered URL list per category. Stores are
//! owned by the [`Aggregator`](crate::output::Aggregator), which decides
//! what gets written; stores only load and save whole lists.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing the output store
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Output directory missing or not writable: {0}")]
    OutputDir(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for output store operations
pub type PersistResult<T> = Result<T, PersistError>;

/// How persisted URLs interact with what the store already holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// The first write of a category in a run replaces previous runs' content;
    /// later writes in the same run merge
    #[default]
    Replace,
    /// Every write merges with the stored content
    Merge,
}

/// What a successful persist did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistOutcome {
    pub category: String,

    /// Human-readable location of the category record
    pub location: String,

    /// URLs stored for the category after the write
    pub total: usize,

    /// URLs this write added
    pub added: usize,
}

/// Category-keyed URL list storage
pub trait OutputStore: Send {
    /// Loads the stored URLs for a category (empty if absent)
    fn load(&self, category: &str) -> PersistResult<Vec<String>>;

    /// Replaces the stored URLs for a category, creating the record if needed
    fn save(&mut self, category: &str, urls: &[String]) -> PersistResult<()>;

    /// Describes where a category's record lives
    fn location(&self, category: &str) -> String;

    /// Lists the categories that currently have a record
    fn categories(&self) -> PersistResult<Vec<String>>;
}
