use crate::config::FetchOptions;
use crate::crawlers::crawler::PageSource;
use crate::filter::{self, DomainScope, UrlFilter};
use crate::parsers::html;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Traversal state for one breadth-first discovery pass.
///
/// `visited` only grows, and never holds more than `max_pages` URLs. A URL is
/// requested at most once per pass, whether or not it redirected or failed.
#[derive(Debug)]
pub struct CrawlState {
    domain: DomainScope,
    frontier: VecDeque<String>,
    queued: HashSet<String>,
    requested: HashSet<String>,
    visited: Vec<Url>,
    seen: HashSet<String>,
    max_pages: usize,
}

impl CrawlState {
    pub fn new(seed: &Url, domain: DomainScope, max_pages: usize) -> Self {
        Self {
            domain,
            frontier: VecDeque::from([seed.to_string()]),
            queued: HashSet::from([seed.to_string()]),
            requested: HashSet::new(),
            visited: Vec::new(),
            seen: HashSet::new(),
            max_pages,
        }
    }

    pub fn domain(&self) -> &DomainScope {
        &self.domain
    }

    /// True once a URL was recorded as a page or already requested
    pub fn is_visited(&self, url: &str) -> bool {
        self.seen.contains(url) || self.requested.contains(url)
    }

    pub fn is_full(&self) -> bool {
        self.visited.len() >= self.max_pages
    }

    /// Next URL to fetch, or `None` once the frontier is empty or the cap is reached
    pub fn next_url(&mut self) -> Option<String> {
        if self.is_full() {
            return None;
        }
        let url = self.frontier.pop_front()?;
        self.queued.remove(&url);
        Some(url)
    }

    /// Note that a URL is about to be fetched. Does not count toward the cap.
    pub fn mark_requested(&mut self, url: &str) {
        self.requested.insert(url.to_string());
    }

    /// Record a fetched page. Returns false if it was already visited or the cap is reached.
    pub fn visit(&mut self, url: Url) -> bool {
        if self.is_full() || !self.seen.insert(url.to_string()) {
            return false;
        }
        self.visited.push(url);
        true
    }

    /// Queue a discovered link unless it was visited, requested or is already waiting
    pub fn enqueue(&mut self, url: &Url) -> bool {
        let url = url.as_str();
        if self.is_visited(url) || !self.queued.insert(url.to_string()) {
            return false;
        }
        self.frontier.push_back(url.to_string());
        true
    }

    pub fn visited(&self) -> &[Url] {
        &self.visited
    }

    pub fn into_visited(self) -> Vec<Url> {
        self.visited
    }
}

/// Breadth-first, domain-scoped discovery of the URLs to analyze
pub struct FrontierDriver<'a, S> {
    source: &'a S,
    filter: &'a UrlFilter,
    options: FetchOptions,
}

impl<'a, S: PageSource> FrontierDriver<'a, S> {
    pub fn new(source: &'a S, filter: &'a UrlFilter, options: FetchOptions) -> Self {
        Self {
            source,
            filter,
            options,
        }
    }

    /// Visit up to `max_pages` same-domain pages starting at `seed`.
    ///
    /// Returns the final (post-redirect) URLs in visit order. Pages that fail to load
    /// are skipped and contribute no links.
    pub async fn crawl(&self, seed: &Url, max_pages: usize) -> Vec<Url> {
        let Some(domain) = DomainScope::of(seed) else {
            ::log::warn!("Seed {} has no host; nothing to crawl", seed);
            return Vec::new();
        };
        let mut state = CrawlState::new(seed, domain, max_pages);

        while let Some(current) = state.next_url() {
            if state.is_visited(&current) {
                ::log::trace!("Skipping already visited: {}", current);
                continue;
            }
            if let Err(e) = filter::validate_url(&current) {
                ::log::debug!("Discarding {}", e);
                continue;
            }

            ::log::debug!("Discovering links on {}", current);
            state.mark_requested(&current);
            let page = match self.source.fetch(&current, self.options).await {
                Ok(page) => page,
                Err(e) => {
                    ::log::warn!("Discovery skipped a page: {}", e);
                    continue;
                }
            };

            // A redirect may land off-domain or on a page we already have
            let is_seed = state.visited().is_empty();
            if !is_seed && !state.domain().contains(&page.final_url) {
                ::log::debug!("{} redirected off-domain to {}", current, page.final_url);
                continue;
            }
            let final_url = filter::normalize_url(&page.final_url);
            if !state.visit(final_url.clone()) {
                continue;
            }

            for href in html::extract_links(&page.html) {
                let Some(link) = filter::resolve_link(&final_url, &href) else {
                    continue;
                };
                if !state.domain().contains(&link) || !self.filter.matches(&link) {
                    continue;
                }
                if state.enqueue(&link) {
                    ::log::debug!("Queuing link for crawling: {}", link);
                }
            }
        }

        ::log::info!(
            "Discovery visited {} page(s) on {}",
            state.visited().len(),
            state.domain().authority()
        );
        state.into_visited()
    }
}
