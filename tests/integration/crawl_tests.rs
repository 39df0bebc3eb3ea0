//! Integration tests for a harvest run
//!
//! These tests use wiremock to serve listing pages and run the full
//! configuration → registry → driver → output store cycle end-to-end.

use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use url_harvest::config::{parse_categories, parse_config, Config};
use url_harvest::output::{open_store, write_markdown_summary, PersistStatus, SkipReason, SourceOutcome};
use url_harvest::{CrawlStatus, Driver, OutputStore, RunReport};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with one crawler bound to the mock server's host
fn create_test_config(server: &MockServer, output_dir: &Path, extra_output: &str, crawler_extra: &str) -> Config {
    let host = url::Url::parse(&server.uri())
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();

    let toml = format!(
        r#"
[run]
categories-file = "unused.json"
min-yield = 2
crawl-timeout = 10

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
directory = "{dir}"
{extra_output}

[[crawler]]
name = "local"
domains = ["{host}"]
article-patterns = ["/article/"]
{crawler_extra}
"#,
        dir = output_dir.display(),
        extra_output = extra_output,
        host = host,
        crawler_extra = crawler_extra,
    );

    parse_config(&toml).expect("test config should be valid")
}

fn listing(links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", anchors),
        "text/html; charset=utf-8",
    )
}

async fn run(config: &Config, categories_json: &str) -> RunReport {
    let categories = parse_categories(categories_json).expect("categories should parse");
    let store = open_store(&config.output).expect("store should open");
    let driver = Driver::from_config(config).expect("registry should build");
    driver.run(&categories, store, CancellationToken::new()).await
}

#[tokio::test]
async fn test_full_run_json_backend() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/sport"))
        .respond_with(listing(&[
            "/article/1",
            "/article/2?utm_source=home",
            "/article/2",
            "/about",
            "https://elsewhere.example/article/9",
        ]))
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path(), "", "");
    let categories = format!(
        r#"{{"sport": ["{base}/sport", "http://unmatched.example/sport"]}}"#,
        base = base
    );

    let report = run(&config, &categories).await;

    assert_eq!(report.entries.len(), 2);
    let crawled = &report.entries[0];
    assert_eq!(crawled.status(), Some(&CrawlStatus::Success));
    assert_eq!(crawled.yield_count(), 2);
    assert!(matches!(
        &crawled.outcome,
        SourceOutcome::Crawled {
            persist: PersistStatus::Persisted { total: 2, .. },
            ..
        }
    ));
    assert_eq!(
        report.entries[1].skip_reason(),
        Some(&SkipReason::NoCrawlerAvailable {
            domain: "unmatched.example".to_string()
        })
    );

    let stored: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("sport.json")).unwrap())
            .unwrap();
    assert_eq!(
        stored,
        vec![format!("{}/article/1", base), format!("{}/article/2", base)]
    );

    let report_path = config.output.report_path();
    report.write_json(Path::new(&report_path)).unwrap();
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written["entries"].as_array().unwrap().len(), 2);
    assert_eq!(written["entries"][0]["outcome"]["outcome"], "crawled");
    assert_eq!(written["entries"][1]["outcome"]["outcome"], "skipped");

    let summary_path = dir.path().join("summary.md");
    write_markdown_summary(&report, &summary_path).unwrap();
    let summary = std::fs::read_to_string(&summary_path).unwrap();
    assert!(summary.contains("sport"));
    assert!(summary.contains("unmatched.example"));
}

#[tokio::test]
async fn test_failing_source_recorded_and_run_continues() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(listing(&["/article/h1", "/article/h2", "/article/h3"]))
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path(), "", "");
    let categories = format!(
        r#"{{"politics": ["{base}/broken"], "health": ["{base}/health"]}}"#,
        base = base
    );

    let report = run(&config, &categories).await;

    assert!(matches!(
        report.entries[0].status(),
        Some(CrawlStatus::CrawlerError { .. })
    ));
    assert_eq!(report.entries[1].status(), Some(&CrawlStatus::Success));
    assert!(!dir.path().join("politics.json").exists());
    assert!(dir.path().join("health.json").exists());
}

#[tokio::test]
async fn test_robots_disallow_is_crawler_error() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(listing(&["/article/secret"]))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path(), "", "");
    let categories = format!(r#"{{"sport": ["{base}/private"]}}"#, base = base);

    let report = run(&config, &categories).await;

    match report.entries[0].status() {
        Some(CrawlStatus::CrawlerError { message }) => assert!(message.contains("robots.txt")),
        other => panic!("unexpected status {:?}", other),
    }
}

#[tokio::test]
async fn test_pagination_and_below_minimum_yield() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("page", "2"))
        .respond_with(listing(&["/article/2"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("page", "3"))
        .respond_with(listing(&["/article/2"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(listing(&["/article/1"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/short"))
        .respond_with(listing(&["/article/only"]))
        .mount(&server)
        .await;

    let config = create_test_config(
        &server,
        dir.path(),
        "",
        "page-param = \"page\"\nmax-pages = 5\npage-delay = 0",
    );
    let categories = format!(
        r#"{{"economic": ["{base}/news"], "travel": ["{base}/short"]}}"#,
        base = base
    );

    let report = run(&config, &categories).await;

    assert_eq!(report.entries[0].status(), Some(&CrawlStatus::Success));
    assert_eq!(report.entries[0].yield_count(), 2);
    assert_eq!(
        report.entries[1].status(),
        Some(&CrawlStatus::BelowMinimumYield { required: 2 })
    );

    let stored: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("travel.json")).unwrap())
            .unwrap();
    assert_eq!(stored, vec![format!("{}/article/only", base)]);
}

#[tokio::test]
async fn test_sqlite_backend_merge_across_runs() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("urls.db");

    let config = create_test_config(
        &server,
        dir.path(),
        &format!(
            "backend = \"sqlite\"\ndatabase-path = \"{}\"\nmode = \"merge\"",
            db_path.display()
        ),
        "",
    );
    let categories = format!(r#"{{"sport": ["{base}/sport"]}}"#, base = base);

    Mock::given(method("GET"))
        .and(path("/sport"))
        .respond_with(listing(&["/article/1", "/article/2"]))
        .mount(&server)
        .await;
    run(&config, &categories).await;

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/sport"))
        .respond_with(listing(&["/article/2", "/article/3"]))
        .mount(&server)
        .await;
    let report = run(&config, &categories).await;

    assert!(matches!(
        &report.entries[0].outcome,
        SourceOutcome::Crawled {
            persist: PersistStatus::Persisted { total: 3, added: 1, .. },
            ..
        }
    ));

    let store = open_store(&config.output).unwrap();
    assert_eq!(
        store.load("sport").unwrap(),
        vec![
            format!("{}/article/1", base),
            format!("{}/article/2", base),
            format!("{}/article/3", base),
        ]
    );
}
