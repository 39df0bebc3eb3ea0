use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (e.g. `data:` or `file:` URLs), it returns None.
///
/// # Arguments
///
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain/host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use url_harvest::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("https://www.rfa.org/khmer").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.rfa.org".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Extracts the site host used for crawler dispatch and domain dedup
///
/// Same as [`extract_domain`] with a leading `www.` removed, so
/// `www.rfa.org` and `rfa.org` are treated as one site.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use url_harvest::url::site_host;
///
/// let url = Url::parse("https://WWW.rfa.org/khmer").unwrap();
/// assert_eq!(site_host(&url), Some("rfa.org".to_string()));
/// ```
pub fn site_host(url: &Url) -> Option<String> {
    extract_domain(url).map(|host| strip_www(&host).to_string())
}

/// Removes a single leading `www.` label
pub(crate) fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
