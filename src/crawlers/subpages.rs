use crate::config::FetchOptions;
use crate::crawlers::crawler::PageSource;
use crate::error::FetchError;
use crate::filter::{self, DomainScope, UrlFilter};
use crate::parsers::html;
use crate::results::PageRecord;
use std::collections::HashSet;
use url::Url;

/// Records produced for a page's subpages, plus the subpages that could not be fetched
#[derive(Debug, Default)]
pub struct SubpageHarvest {
    pub records: Vec<PageRecord>,
    pub failures: Vec<FetchError>,
}

impl SubpageHarvest {
    /// One-line description of the skipped subpages, if any
    pub fn failure_note(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let note = self
            .failures
            .iter()
            .map(|e| format!("subpage fetch failed: {} ({})", e.url, e.cause))
            .collect::<Vec<_>>()
            .join("; ");
        Some(note)
    }
}

/// Same-authority link targets of a page, deduplicated in document order.
///
/// The page's own URL is never a candidate.
pub fn candidate_links(base: &Url, hrefs: &[String], url_filter: &UrlFilter) -> Vec<Url> {
    let Some(scope) = DomainScope::of(base) else {
        return Vec::new();
    };
    let base = filter::normalize_url(base);

    let mut seen = HashSet::new();
    hrefs
        .iter()
        .filter_map(|href| filter::resolve_link(&base, href))
        .filter(|link| *link != base && scope.contains(link) && url_filter.matches(link))
        .filter(|link| seen.insert(link.to_string()))
        .collect()
}

/// Fetches a handful of a page's own subpages, reusing the page's classification
pub struct SubpageDiscoverer<'a, S> {
    source: &'a S,
    filter: &'a UrlFilter,
    options: FetchOptions,
    cap: usize,
}

impl<'a, S: PageSource> SubpageDiscoverer<'a, S> {
    pub fn new(source: &'a S, filter: &'a UrlFilter, options: FetchOptions, cap: usize) -> Self {
        Self {
            source,
            filter,
            options,
            cap,
        }
    }

    /// Fetch and extract up to `cap` subpages of `base`.
    ///
    /// Each record inherits `site_type`. A subpage that fails to load is logged,
    /// reported in the harvest's failures and skipped.
    pub async fn harvest(&self, base: &Url, hrefs: &[String], site_type: &str) -> SubpageHarvest {
        let mut harvest = SubpageHarvest::default();

        for link in candidate_links(base, hrefs, self.filter)
            .into_iter()
            .take(self.cap)
        {
            match self.source.fetch(link.as_str(), self.options).await {
                Ok(page) => {
                    let content = html::extract_text(&page.html);
                    harvest
                        .records
                        .push(PageRecord::new(page.final_url, site_type, content));
                }
                Err(e) => {
                    ::log::warn!("Subpage error ({}): {}", link, e.cause);
                    harvest.failures.push(e);
                }
            }
        }

        harvest
    }
}
