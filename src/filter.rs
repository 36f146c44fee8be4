use crate::error::InvalidUrlError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Extra regex rules applied to discovered links on top of the domain scope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlFilterConfig {
    /// Regex patterns for URLs to include (if empty, all URLs are included unless excluded)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude (these take precedence over include patterns)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Compiled include/exclude patterns
#[derive(Debug, Default)]
pub struct UrlFilter {
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    /// Compile a filter from configuration
    pub fn new(config: &UrlFilterConfig) -> Result<Self, regex::Error> {
        let include_regexes = config
            .include_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let exclude_regexes = config
            .exclude_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_regexes,
            exclude_regexes,
        })
    }

    /// Whether the URL passes the pattern rules. Exclusions win over inclusions.
    pub fn matches(&self, url: &Url) -> bool {
        let url_str = url.as_str();
        if self.exclude_regexes.iter().any(|r| r.is_match(url_str)) {
            return false;
        }

        self.include_regexes.is_empty() || self.include_regexes.iter().any(|r| r.is_match(url_str))
    }
}

/// The network authority (host and optional port) a crawl is confined to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    authority: String,
}

impl DomainScope {
    /// Scope of the given URL, or `None` for URLs without a host
    pub fn of(url: &Url) -> Option<Self> {
        authority(url).map(|authority| Self { authority })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// True if the URL is http(s) and shares this scope's authority
    pub fn contains(&self, url: &Url) -> bool {
        is_http(url) && authority(url).as_deref() == Some(self.authority.as_str())
    }
}

/// Host plus explicit port, e.g. `example.com` or `localhost:8080`
pub fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Parse a URL and require an http or https scheme
pub fn validate_url(raw: &str) -> Result<Url, InvalidUrlError> {
    let url = Url::parse(raw).map_err(|source| InvalidUrlError::Malformed {
        url: raw.to_string(),
        source,
    })?;

    if !is_http(&url) {
        return Err(InvalidUrlError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    Ok(url)
}

/// Create a normalized version of the URL (fragment removed)
pub fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized
}

/// Resolve an href against the page it was found on.
///
/// Returns `None` for unparseable targets and for non-http(s) schemes such as
/// `mailto:` or `javascript:`.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let resolved = base.join(href.trim()).ok()?;
    if !is_http(&resolved) {
        return None;
    }
    Some(normalize_url(&resolved))
}
