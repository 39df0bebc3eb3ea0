//! HTML parser for extracting candidate article links
//!
//! Every `<a href>` on a listing page is resolved against the page URL and
//! normalized; filtering down to article links happens in the crawler.

use crate::url::normalize_url;
use scraper::{Html, Selector};
use url::Url;

/// Extracts all followable links from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
/// - Anything that is not HTTP(S) after resolution
///
/// Links are returned normalized (see [`normalize_url`]) in document order;
/// duplicates are kept.
///
/// # Example
///
/// ```
/// use url_harvest::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/news/1.html#top">One</a><a href="mailto:x@y.z">Mail</a>"#;
/// let base_url = Url::parse("https://example.com/news/").unwrap();
/// let links = extract_links(html, &base_url);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/news/1.html");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            if let Some(link) = resolve_link(href, base_url) {
                links.push(link);
            }
        }
    }

    links
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    normalize_url(absolute_url.as_str()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/category/sport").unwrap()
    }

    fn links(html: &str) -> Vec<String> {
        extract_links(html, &base_url())
            .into_iter()
            .map(|u| u.to_string())
            .collect()
    }

    #[test]
    fn test_extract_absolute_link() {
        let found = links(r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#);
        assert_eq!(found, vec!["https://other.com/page"]);
    }

    #[test]
    fn test_extract_relative_links() {
        let found = links(r#"<a href="/article/1">One</a><a href="2">Two</a>"#);
        assert_eq!(
            found,
            vec!["https://example.com/article/1", "https://example.com/category/2"]
        );
    }

    #[test]
    fn test_links_are_normalized() {
        let found = links(r#"<a href="HTTPS://Example.com/news/1.html?utm_source=fb#comments">x</a>"#);
        assert_eq!(found, vec!["https://example.com/news/1.html"]);
    }

    #[test]
    fn test_skip_special_schemes() {
        let found = links(
            r#"
            <a href="javascript:void(0)">js</a>
            <a href="JavaScript:alert(1)">js</a>
            <a href="mailto:test@example.com">mail</a>
            <a href="tel:+1234567890">call</a>
            <a href="data:text/html,<h1>Test</h1>">data</a>
            <a href="ftp://example.com/file">ftp</a>
            "#,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_skip_download_and_fragment_links() {
        let found = links(
            r##"<a href="/file.pdf" download>Download</a><a href="#section">Jump</a><a href="">Empty</a>"##,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_duplicates_kept_in_document_order() {
        let found = links(r#"<a href="/b">b</a><a href="/a">a</a><a href="/b">b again</a>"#);
        assert_eq!(
            found,
            vec![
                "https://example.com/b",
                "https://example.com/a",
                "https://example.com/b"
            ]
        );
    }
}
