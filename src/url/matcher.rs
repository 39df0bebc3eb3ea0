use crate::config::validate_domain_pattern;
use crate::url::domain::strip_www;
use crate::ConfigError;
use std::fmt;

/// A domain-matching rule bound to a crawler
///
/// Two forms are supported:
/// 1. Exact: `"example.com"` matches only `example.com`
/// 2. Suffix: `"*.example.com"` matches:
///    - `example.com` (the bare domain)
///    - `sport.example.com` (single subdomain)
///    - `api.v2.example.com` (nested subdomains)
///
/// Rules are stored lowercased with a leading `www.` removed, and are
/// compared against hosts normalized the same way (see [`crate::url::site_host`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DomainRule {
    Exact(String),
    Suffix(String),
}

impl DomainRule {
    /// Parses a rule from its configuration form
    ///
    /// # Examples
    ///
    /// ```
    /// use url_harvest::url::DomainRule;
    ///
    /// let rule = DomainRule::parse("*.Example.com").unwrap();
    /// assert!(rule.matches("example.com"));
    /// assert!(rule.matches("blog.example.com"));
    /// assert!(!rule.matches("example.org"));
    ///
    /// assert!(DomainRule::parse("www.rfa.org").unwrap().matches("rfa.org"));
    /// assert!(DomainRule::parse("localhost").is_err());
    /// ```
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = pattern.trim().to_lowercase();
        validate_domain_pattern(&pattern)?;

        match pattern.strip_prefix("*.") {
            Some(base) => Ok(DomainRule::Suffix(strip_www(base).to_string())),
            None => Ok(DomainRule::Exact(strip_www(&pattern).to_string())),
        }
    }

    /// The rule's host, without the wildcard
    pub fn host(&self) -> &str {
        match self {
            DomainRule::Exact(host) | DomainRule::Suffix(host) => host,
        }
    }

    /// Checks whether a normalized host matches this rule
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            DomainRule::Exact(host) => candidate == host,
            DomainRule::Suffix(base) => {
                candidate == base
                    || (candidate.len() > base.len()
                        && candidate.ends_with(base.as_str())
                        && candidate.as_bytes()[candidate.len() - base.len() - 1] == b'.')
            }
        }
    }

    /// How specific the rule is; longer rule hosts win over shorter ones
    pub fn specificity(&self) -> usize {
        self.host().len()
    }
}

impl fmt::Display for DomainRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainRule::Exact(host) => write!(f, "{}", host),
            DomainRule::Suffix(base) => write!(f, "*.{}", base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str) -> DomainRule {
        DomainRule::parse(pattern).unwrap()
    }

    #[test]
    fn test_exact_match() {
        assert!(rule("example.com").matches("example.com"));
        assert!(rule("blog.example.com").matches("blog.example.com"));
    }

    #[test]
    fn test_exact_no_match() {
        assert!(!rule("example.com").matches("other.com"));
        assert!(!rule("example.com").matches("blog.example.com"));
        assert!(!rule("blog.example.com").matches("example.com"));
    }

    #[test]
    fn test_wildcard_matches_bare_domain() {
        assert!(rule("*.example.com").matches("example.com"));
        assert!(rule("*.github.com").matches("github.com"));
    }

    #[test]
    fn test_wildcard_matches_nested_subdomains() {
        assert!(rule("*.example.com").matches("blog.example.com"));
        assert!(rule("*.example.com").matches("api.v2.example.com"));
    }

    #[test]
    fn test_wildcard_no_match_partial() {
        assert!(!rule("*.example.com").matches("myexample.com"));
        assert!(!rule("*.example.com").matches("example.com.org"));
        assert!(!rule("*.example.com").matches("example.org"));
        assert!(!rule("*.example.com").matches(""));
    }

    #[test]
    fn test_multiple_dots_in_base() {
        let r = rule("*.com.kh");
        assert!(r.matches("com.kh"));
        assert!(r.matches("btv.com.kh"));
        assert!(!r.matches("com.jp"));
    }

    #[test]
    fn test_parse_normalizes_case_and_www() {
        assert_eq!(rule("WWW.RFA.org"), DomainRule::Exact("rfa.org".to_string()));
        assert_eq!(
            rule("*.www.Sabay.com.kh"),
            DomainRule::Suffix("sabay.com.kh".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_invalid_patterns() {
        assert!(matches!(
            DomainRule::parse("").unwrap_err(),
            ConfigError::InvalidPattern(_)
        ));
        assert!(DomainRule::parse("*.").is_err());
        assert!(DomainRule::parse("bad host.com").is_err());
    }

    #[test]
    fn test_specificity_and_display() {
        assert!(rule("news.example.com").specificity() > rule("*.example.com").specificity());
        assert_eq!(rule("*.example.com").to_string(), "*.example.com");
        assert_eq!(rule("example.com").to_string(), "example.com");
    }
}
