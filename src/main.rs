//! url-harvest main entry point
//!
//! This is the command-line interface for the url-harvest article URL collector.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use url_harvest::config::{
    load_categories_with_hash, load_config, select_categories, validate_category_outputs,
    Category, Config,
};
use url_harvest::output::{load_statistics, open_store, print_statistics, write_markdown_summary};
use url_harvest::{ConfigError, Driver, RegistryBuilder, RunOptions};

/// url-harvest: category-driven article URL collection
///
/// Reads a categories document mapping editorial categories to news
/// sources, dispatches each source to the crawler registered for its
/// domain, and stores the collected article URLs per category.
#[derive(Parser, Debug)]
#[command(name = "url-harvest")]
#[command(version = "0.1.0")]
#[command(about = "Category-driven article URL collection", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Only run the named category (repeatable)
    #[arg(short, long = "category", value_name = "NAME")]
    categories: Vec<String>,

    /// Only dispatch sources to the named crawler (repeatable)
    #[arg(long = "crawler", value_name = "NAME")]
    crawlers: Vec<String>,

    /// Override the categories document path
    #[arg(long, value_name = "PATH")]
    categories_file: Option<PathBuf>,

    /// Override the output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

    /// Override the minimum yield per source
    #[arg(long, value_name = "N")]
    min_yield: Option<usize>,

    /// Crawl only the first source seen for each domain
    #[arg(long)]
    dedupe_by_domain: bool,

    /// Override the number of sources crawled at once
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=64))]
    concurrency: Option<u32>,

    /// Override the per-crawl timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// List registered crawlers and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    list: bool,

    /// Show how each source would be dispatched without crawling
    #[arg(long, conflicts_with_all = ["list", "stats"])]
    dry_run: bool,

    /// Show statistics from the output store and exit
    #[arg(long, conflicts_with_all = ["list", "dry_run"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    apply_overrides(&mut config, &cli);

    if cli.list {
        handle_list(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.dry_run {
        handle_dry_run(&config, &cli.categories, &cli.crawlers)?;
    } else {
        handle_run(config, &cli.categories, &cli.crawlers).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("url_harvest=info,warn"),
            1 => EnvFilter::new("url_harvest=debug,info"),
            2 => EnvFilter::new("url_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(path) = &cli.categories_file {
        config.run.categories_file = path.display().to_string();
    }
    if let Some(dir) = &cli.output {
        config.output.directory = dir.clone();
    }
    if let Some(min_yield) = cli.min_yield {
        config.run.min_yield = min_yield;
    }
    if cli.dedupe_by_domain {
        config.run.dedupe_by_domain = true;
    }
    if let Some(concurrency) = cli.concurrency {
        config.run.max_concurrent_sources = concurrency;
    }
    if let Some(timeout) = cli.timeout {
        config.run.crawl_timeout = timeout;
    }
}

/// Loads the categories document and applies the `--category` filter
///
/// Fails when a category's output file would clash with another category
/// or with the run report.
fn load_selected_categories(
    config: &Config,
    filter: &[String],
) -> Result<(Vec<Category>, String), ConfigError> {
    let path = Path::new(&config.run.categories_file);
    tracing::info!("Loading categories from: {}", path.display());

    let (categories, hash) = match load_categories_with_hash(path) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load categories: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Categories loaded successfully (hash: {})", hash);

    if let Err(e) = validate_category_outputs(config, &categories) {
        tracing::error!("Invalid category output layout: {}", e);
        return Err(e);
    }

    Ok((select_categories(categories, filter), hash))
}

/// Handles the --list mode: shows the registered crawlers
fn handle_list(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let registry = RegistryBuilder::from_config(config)?;

    println!("=== Registered Crawlers ({}) ===\n", registry.len());
    for descriptor in registry.descriptors() {
        let rules: Vec<String> = descriptor.rules.iter().map(|r| r.to_string()).collect();
        println!("  - {}: {}", descriptor.name, rules.join(", "));
    }

    Ok(())
}

/// Handles the --dry-run mode: shows which crawler each source would use
fn handle_dry_run(
    config: &Config,
    filter: &[String],
    crawlers: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = RegistryBuilder::from_config(config)?;
    let (categories, _hash) = load_selected_categories(config, filter)?;
    let options = RunOptions::from_config(config).with_crawler_filter(crawlers.to_vec());

    println!("=== url-harvest Dry Run ===\n");

    println!("Run:");
    println!("  Minimum yield: {}", config.run.min_yield);
    println!("  Concurrent sources: {}", config.run.max_concurrent_sources);
    println!("  Crawl timeout: {}s", config.run.crawl_timeout);
    println!("  Dedupe by domain: {}", config.run.dedupe_by_domain);
    match config.run.max_urls_per_category {
        Some(target) => println!("  URLs per category: {}", target),
        None => println!("  URLs per category: unlimited"),
    }
    if !crawlers.is_empty() {
        println!("  Crawlers: {}", crawlers.join(", "));
    }

    println!("\nOutput:");
    println!("  Backend: {:?}", config.output.backend);
    println!("  Directory: {}", config.output.directory);
    println!("  Mode: {:?}", config.output.mode);
    println!("  Report: {}", config.output.report_path());

    let mut dispatched = 0;
    let mut unmatched = 0;
    let mut filtered = 0;
    for category in &categories {
        println!("\n{} ({} sources):", category.name, category.sources.len());
        for source in &category.sources {
            match registry.resolve_source(source) {
                Ok(name) if !options.allows_crawler(name) => {
                    filtered += 1;
                    println!("  - {} -> {} (not selected)", source.url, name);
                }
                Ok(name) => {
                    dispatched += 1;
                    println!("  - {} -> {}", source.url, name);
                }
                Err(e) => {
                    unmatched += 1;
                    println!("  - {} -> ({})", source.url, e);
                }
            }
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl {} sources ({} without a crawler, {} filtered out)",
        dispatched, unmatched, filtered
    );

    Ok(())
}

/// Handles the --stats mode: shows what the output store holds
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(&config.output)?;
    let stats = load_statistics(store.as_ref())?;
    print_statistics(&stats);
    Ok(())
}

/// Handles a harvest run
///
/// Only configuration, categories and store failures are returned as
/// errors. Per-source problems end up in the run report.
async fn handle_run(
    config: Config,
    filter: &[String],
    crawlers: &[String],
) -> url_harvest::Result<()> {
    let (categories, hash) = load_selected_categories(&config, filter)?;
    let registry = RegistryBuilder::from_config(&config)?;
    let store = open_store(&config.output)?;

    tracing::info!(
        "Registered crawlers: {}, categories: {}",
        registry.len(),
        categories.len()
    );

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight sources");
            signal_token.cancel();
        }
    });

    let options = RunOptions::from_config(&config).with_crawler_filter(crawlers.to_vec());
    let driver = Driver::new(Arc::new(registry), options);
    let mut report = driver.run(&categories, store, cancel).await;
    report.categories_hash = Some(hash);

    let report_path = config.output.report_path();
    match report.write_json(Path::new(&report_path)) {
        Ok(()) => tracing::info!("Run report written to: {}", report_path),
        Err(e) => tracing::error!("Failed to write run report: {}", e),
    }

    if let Some(summary_path) = &config.output.summary_path {
        match write_markdown_summary(&report, Path::new(summary_path)) {
            Ok(()) => tracing::info!("Summary written to: {}", summary_path),
            Err(e) => tracing::error!("Failed to write summary: {}", e),
        }
    }

    Ok(())
}
