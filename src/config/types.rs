use crate::output::PersistMode;
use serde::Deserialize;

/// Main configuration structure for url-harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub run: RunConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "crawler")]
    pub crawlers: Vec<CrawlerEntry>,
}

/// Run behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Path to the JSON categories document
    #[serde(rename = "categories-file")]
    pub categories_file: String,

    /// Minimum number of unique URLs a source must yield to count as a success
    #[serde(rename = "min-yield", default)]
    pub min_yield: usize,

    /// Maximum number of sources crawled at the same time
    #[serde(
        rename = "max-concurrent-sources",
        default = "default_max_concurrent_sources"
    )]
    pub max_concurrent_sources: u32,

    /// Per-invocation crawler timeout (seconds)
    #[serde(rename = "crawl-timeout", default = "default_crawl_timeout")]
    pub crawl_timeout: u64,

    /// Only crawl the first source seen for each domain
    #[serde(rename = "dedupe-by-domain", default)]
    pub dedupe_by_domain: bool,

    /// Stop crawling a category's sources once it holds this many URLs
    #[serde(rename = "max-urls-per-category")]
    pub max_urls_per_category: Option<usize>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the user agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputBackend {
    /// One JSON array file per category
    Json,
    /// A SQLite database holding every category
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding per-category output and run reports
    pub directory: String,

    /// Storage backend for the category URL lists
    #[serde(default = "default_backend")]
    pub backend: OutputBackend,

    /// SQLite database path (sqlite backend only)
    #[serde(rename = "database-path")]
    pub database_path: Option<String>,

    /// Replace or merge semantics
    #[serde(default)]
    pub mode: PersistMode,

    /// Where the JSON run report is written (defaults to `<directory>/run_report.json`)
    #[serde(rename = "report-path")]
    pub report_path: Option<String>,

    /// Optional markdown summary of the run
    #[serde(rename = "summary-path")]
    pub summary_path: Option<String>,
}

impl OutputConfig {
    /// Returns the effective JSON report path
    pub fn report_path(&self) -> String {
        self.report_path
            .clone()
            .unwrap_or_else(|| format!("{}/run_report.json", self.directory))
    }
}

/// A crawler registered for one or more domains
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerEntry {
    /// Unique crawler name (also the key used by keyed category sources)
    pub name: String,

    /// Domain patterns (e.g., "example.com" or "*.example.com")
    pub domains: Vec<String>,

    /// Substrings that mark a link as an article URL
    #[serde(rename = "article-patterns", default)]
    pub article_patterns: Vec<String>,

    /// Query parameter used for pagination ("page" → ?page=2, ?page=3, ...)
    #[serde(rename = "page-param")]
    pub page_param: Option<String>,

    /// Maximum number of listing pages fetched per source
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Delay between listing pages (milliseconds)
    #[serde(rename = "page-delay", default = "default_page_delay")]
    pub page_delay: u64,

    /// Whether robots.txt is consulted before fetching
    #[serde(rename = "respect-robots", default = "default_true")]
    pub respect_robots: bool,
}

fn default_max_concurrent_sources() -> u32 {
    1
}

fn default_crawl_timeout() -> u64 {
    300
}

fn default_backend() -> OutputBackend {
    OutputBackend::Json
}

fn default_max_pages() -> u32 {
    1
}

fn default_page_delay() -> u64 {
    500
}

fn default_true() -> bool {
    true
}
