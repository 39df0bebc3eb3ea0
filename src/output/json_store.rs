//! JSON directory output store
//!
//! One pretty-printed JSON array per category at `<dir>/<category>.json`.
//! Files are replaced atomically: content goes to a temp file in the same
//! directory which is then renamed over the target.

use crate::output::traits::{OutputStore, PersistError, PersistResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Ensures the output directory exists, creating it if missing
pub fn ensure_output_dir(dir: &Path) -> PersistResult<()> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically writes `content` to `path`, creating its parent directory
pub fn write_atomic(path: &Path, content: &str) -> PersistResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_output_dir(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| PersistError::io(&dir, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| PersistError::io(tmp.path(), e))?;
    tmp.flush().map_err(|e| PersistError::io(tmp.path(), e))?;
    tmp.as_file_mut()
        .sync_all()
        .map_err(|e| PersistError::io(path, e))?;

    tmp.persist(path)
        .map_err(|e| PersistError::io(path, e.error))?;
    Ok(())
}

/// Stem used for the empty category name; never produced by percent-encoding
const EMPTY_STEM: &str = "%";

/// Turns a category name into a file stem
///
/// ASCII letters, digits, `-`, `_`, `.` and `~` are kept; every other byte is
/// percent-encoded, so distinct names always get distinct files
/// (`world news` → `world%20news`, `world_news` → `world_news`).
pub fn encode_file_stem(category: &str) -> String {
    if category.is_empty() {
        return EMPTY_STEM.to_string();
    }
    urlencoding::encode(category).into_owned()
}

/// Recovers the category name from a file stem written by [`encode_file_stem`]
pub fn decode_file_stem(stem: &str) -> Option<String> {
    if stem == EMPTY_STEM {
        return Some(String::new());
    }
    let category = urlencoding::decode(stem).ok()?.into_owned();
    (encode_file_stem(&category) == stem).then_some(category)
}

/// Where an unreadable category file is moved before it gets overwritten
fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

/// Output store writing one JSON file per category
#[derive(Debug, Clone)]
pub struct JsonDirectoryStore {
    dir: PathBuf,
}

impl JsonDirectoryStore {
    /// Opens a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> PersistResult<Self> {
        let dir = dir.into();
        ensure_output_dir(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding a category
    pub fn path_for(&self, category: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_file_stem(category)))
    }

    fn read_list(path: &Path) -> PersistResult<Option<Vec<String>>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistError::io(path, e)),
        };
        Ok(serde_json::from_str::<Vec<String>>(&content).ok())
    }
}

impl OutputStore for JsonDirectoryStore {
    fn load(&self, category: &str) -> PersistResult<Vec<String>> {
        let path = self.path_for(category);
        if !path.exists() {
            return Ok(Vec::new());
        }

        match Self::read_list(&path)? {
            Some(urls) => Ok(urls),
            None => {
                let aside = corrupt_path(&path);
                fs::rename(&path, &aside).map_err(|e| PersistError::io(&path, e))?;
                tracing::warn!(
                    "{} is not a JSON array of URLs; moved to {} and treating it as empty",
                    path.display(),
                    aside.display()
                );
                Ok(Vec::new())
            }
        }
    }

    fn save(&mut self, category: &str, urls: &[String]) -> PersistResult<()> {
        let path = self.path_for(category);
        let content = serde_json::to_string_pretty(urls)?;
        write_atomic(&path, &content)
    }

    fn location(&self, category: &str) -> String {
        self.path_for(category).display().to_string()
    }

    fn categories(&self) -> PersistResult<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| PersistError::io(&self.dir, e))?;

        let mut categories = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| PersistError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // Other JSON files (run reports) share the directory
            if let Ok(Some(_)) = Self::read_list(&path) {
                if let Some(category) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(decode_file_stem)
                {
                    categories.push(category);
                }
            }
        }

        categories.sort();
        Ok(categories)
    }
}
