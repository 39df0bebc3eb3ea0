use crate::config::types::{
    Config, CrawlerEntry, OutputBackend, OutputConfig, RunConfig, UserAgentConfig,
};
use crate::config::Category;
use crate::output::encode_file_stem;
use crate::ConfigError;
use std::collections::HashMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_run_config(&config.run)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_crawlers(&config.crawlers)?;
    Ok(())
}

/// Validates run configuration
fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    if config.categories_file.is_empty() {
        return Err(ConfigError::Validation(
            "categories_file cannot be empty".to_string(),
        ));
    }

    if config.max_concurrent_sources < 1 || config.max_concurrent_sources > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_sources must be between 1 and 64, got {}",
            config.max_concurrent_sources
        )));
    }

    if config.max_urls_per_category == Some(0) {
        return Err(ConfigError::Validation(
            "max_urls_per_category must be >= 1 when set".to_string(),
        ));
    }

    if config.crawl_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "crawl_timeout must be >= 1s, got {}s",
            config.crawl_timeout
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.backend == OutputBackend::Sqlite
        && config.database_path.as_deref().map_or(true, str::is_empty)
    {
        return Err(ConfigError::Validation(
            "database_path is required for the sqlite backend".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler entries
fn validate_crawlers(crawlers: &[CrawlerEntry]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for entry in crawlers {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "crawler name cannot be empty".to_string(),
            ));
        }

        if !names.insert(entry.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate crawler name '{}'",
                entry.name
            )));
        }

        if entry.domains.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Crawler '{}' must have at least one domain",
                entry.name
            )));
        }

        for domain in &entry.domains {
            validate_domain_pattern(domain)?;
        }

        if entry.max_pages < 1 {
            return Err(ConfigError::Validation(format!(
                "Crawler '{}' max_pages must be >= 1",
                entry.name
            )));
        }
    }

    Ok(())
}

/// Checks that every category gets its own output file
///
/// Only the JSON backend stores categories as files. A category file must
/// not be the run report or summary, and no two category files may differ
/// only by case.
///
/// # Arguments
///
/// * `config` - The validated run configuration
/// * `categories` - Every category in the categories document
pub fn validate_category_outputs(
    config: &Config,
    categories: &[Category],
) -> Result<(), ConfigError> {
    if config.output.backend != OutputBackend::Json {
        return Ok(());
    }

    let dir = Path::new(&config.output.directory);
    let mut reserved = vec![PathBuf::from(config.output.report_path())];
    if let Some(summary) = &config.output.summary_path {
        reserved.push(PathBuf::from(summary));
    }

    let mut stems: HashMap<String, &str> = HashMap::new();
    for category in categories {
        let stem = encode_file_stem(&category.name);
        let path = dir.join(format!("{}.json", stem));

        if reserved.iter().any(|r| *r == path) {
            return Err(ConfigError::Validation(format!(
                "Category '{}' would be written to {}, which is also a run output file",
                category.name,
                path.display()
            )));
        }

        if let Some(other) = stems.insert(stem.to_lowercase(), &category.name) {
            return Err(ConfigError::Validation(format!(
                "Categories '{}' and '{}' differ only by case and would share an output file",
                other, category.name
            )));
        }
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
pub(crate) fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)?;
    } else {
        validate_domain_string(pattern)?;
    }

    Ok(())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // Must contain at least one dot (e.g., example.com, not just "example")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
