//! SQLite output store
//!
//! Every category lives in one table, one row per URL, ordered by position.
//! A save replaces all of a category's rows inside a single transaction.

use crate::output::traits::{OutputStore, PersistError, PersistResult};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// SQL schema for the output database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS category_urls (
    category TEXT NOT NULL,
    position INTEGER NOT NULL,
    url TEXT NOT NULL,
    PRIMARY KEY (category, position)
);

CREATE INDEX IF NOT EXISTS idx_category_urls_url ON category_urls(url);
"#;

/// Initializes the database schema (idempotent)
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

/// SQLite-backed output store
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(PersistError)` - Failed to create the parent directory or open the database
    pub fn open(path: &Path) -> PersistResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PersistError::io(parent, e))?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    /// Counts all stored URLs across categories
    pub fn count_urls(&self) -> PersistResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM category_urls", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl OutputStore for SqliteStore {
    fn load(&self, category: &str) -> PersistResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM category_urls WHERE category = ?1 ORDER BY position")?;

        let urls = stmt
            .query_map(params![category], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(urls)
    }

    fn save(&mut self, category: &str, urls: &[String]) -> PersistResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM category_urls WHERE category = ?1",
            params![category],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO category_urls (category, position, url) VALUES (?1, ?2, ?3)",
            )?;
            for (position, url) in urls.iter().enumerate() {
                stmt.execute(params![category, position as i64, url])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn location(&self, category: &str) -> String {
        format!("{}#{}", self.path.display(), category)
    }

    fn categories(&self) -> PersistResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT category FROM category_urls ORDER BY category")?;

        let categories = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(categories)
    }
}
