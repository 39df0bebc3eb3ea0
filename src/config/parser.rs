use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a run configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use url_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Minimum yield: {}", config.run.min_yield);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates a run configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of a file's content
///
/// Recorded in run reports so results can be traced back to the exact
/// categories document they were produced from.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputBackend;
    use crate::output::PersistMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
[run]
categories-file = "config/categories.json"
min-yield = 50
max-concurrent-sources = 3

[user-agent]
crawler-name = "TestHarvester"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
directory = "./output/urls"

[[crawler]]
name = "btv"
domains = ["btv.com.kh"]
article-patterns = ["/article/"]
page-param = "page"
max-pages = 5

[[crawler]]
name = "rfa"
domains = ["*.rfa.org"]
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.run.min_yield, 50);
        assert_eq!(config.run.max_concurrent_sources, 3);
        assert_eq!(config.run.crawl_timeout, 300);
        assert!(!config.run.dedupe_by_domain);
        assert_eq!(config.run.max_urls_per_category, None);
        assert_eq!(config.user_agent.crawler_name, "TestHarvester");
        assert_eq!(config.output.backend, OutputBackend::Json);
        assert_eq!(config.output.mode, PersistMode::Replace);
        assert_eq!(config.output.report_path(), "./output/urls/run_report.json");
        assert_eq!(config.crawlers.len(), 2);
        assert_eq!(config.crawlers[0].max_pages, 5);
        assert_eq!(config.crawlers[1].max_pages, 1);
        assert!(config.crawlers[1].respect_robots);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = VALID_CONFIG.replace("max-concurrent-sources = 3", "max-concurrent-sources = 0");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_max_urls_per_category() {
        let content = VALID_CONFIG.replace(
            "max-concurrent-sources = 3",
            "max-concurrent-sources = 3\nmax-urls-per-category = 2500",
        );
        assert_eq!(
            parse_config(&content).unwrap().run.max_urls_per_category,
            Some(2500)
        );

        let content = content.replace("2500", "0");
        assert!(matches!(
            parse_config(&content).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn test_sqlite_backend_requires_database_path() {
        let content = VALID_CONFIG.replace(
            "directory = \"./output/urls\"",
            "directory = \"./output/urls\"\nbackend = \"sqlite\"",
        );
        assert!(matches!(
            parse_config(&content).unwrap_err(),
            ConfigError::Validation(_)
        ));

        let content = content.replace(
            "backend = \"sqlite\"",
            "backend = \"sqlite\"\ndatabase-path = \"./urls.db\"",
        );
        assert_eq!(parse_config(&content).unwrap().output.backend, OutputBackend::Sqlite);
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        assert_ne!(
            compute_config_hash(file1.path()).unwrap(),
            compute_config_hash(file2.path()).unwrap()
        );
    }
}
