use crate::classifier::SiteClassifier;
use crate::config::AnalyzerConfig;
use crate::crawlers::frontier::FrontierDriver;
use crate::crawlers::subpages::SubpageDiscoverer;
use crate::crawlers::{BrowserSession, PageSource, Session, SessionConfig};
use crate::error::{AnalyzeError, ConfigError, FetchError};
use crate::filter::{self, UrlFilter};
use crate::parsers;
use crate::providers::{AnyProvider, TextCompletion};
use crate::results::PageRecord;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Accumulates records in emission order, optionally keeping only the first per URL
struct RecordSet {
    records: Vec<PageRecord>,
    seen: Option<HashSet<String>>,
}

impl RecordSet {
    fn new(dedupe: bool) -> Self {
        Self {
            records: Vec::new(),
            seen: dedupe.then(HashSet::new),
        }
    }

    fn push(&mut self, record: PageRecord) {
        if let Some(seen) = &mut self.seen {
            if !seen.insert(record.url().to_string()) {
                ::log::debug!("Dropping duplicate record for {}", record.url());
                return;
            }
        }
        self.records.push(record);
    }

    fn into_vec(self) -> Vec<PageRecord> {
        self.records
    }
}

/// Crawl orchestrator: discovery, then per-page fetch, extract, classify and subpage harvest
pub struct Analyzer<P> {
    config: AnalyzerConfig,
    url_filter: UrlFilter,
    classifier: SiteClassifier<P>,
}

impl Analyzer<AnyProvider> {
    /// Build an analyzer using the provider named in the configuration
    pub fn from_config(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        let provider = AnyProvider::from_config(&config.provider)?;
        ::log::debug!("Using {} for classification", provider.name());
        Self::new(config, provider)
    }
}

impl<P: TextCompletion> Analyzer<P> {
    pub fn new(config: AnalyzerConfig, provider: P) -> Result<Self, ConfigError> {
        let url_filter = UrlFilter::new(&config.url_filter)?;
        let classifier = SiteClassifier::new(provider, config.classifier.clone());
        Ok(Self {
            config,
            url_filter,
            classifier,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn classifier(&self) -> &SiteClassifier<P> {
        &self.classifier
    }

    /// Analyze a site with a fresh browser session
    pub async fn analyze(
        &self,
        seed: &str,
        max_pages: usize,
    ) -> Result<Vec<PageRecord>, AnalyzeError> {
        self.analyze_with_cancel(seed, max_pages, &CancellationToken::new())
            .await
    }

    /// Like [`Analyzer::analyze`], stopping early once `cancel` fires.
    ///
    /// Cancellation is observed between top-level URLs; the records gathered so far
    /// are returned. The browser session is released on every path out.
    pub async fn analyze_with_cancel(
        &self,
        seed: &str,
        max_pages: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<PageRecord>, AnalyzeError> {
        let seed = match filter::validate_url(seed) {
            Ok(url) => url,
            Err(e) => {
                ::log::warn!("Not crawling: {}", e);
                return Err(AnalyzeError::NoUrlsFound);
            }
        };

        let session = BrowserSession::start(&SessionConfig::from(&self.config)).await?;
        self.analyze_in_session(session, &seed, max_pages, cancel)
            .await
    }

    /// Owns the session for the whole run, so dropping this future also drops
    /// (and releases) the session.
    async fn analyze_in_session<S: Session>(
        &self,
        mut session: S,
        seed: &Url,
        max_pages: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<PageRecord>, AnalyzeError> {
        let outcome = self.analyze_site(&session, seed, max_pages, cancel).await;
        session.stop().await;
        outcome
    }

    /// Run discovery and analysis against any page source
    pub async fn analyze_site<S: PageSource>(
        &self,
        source: &S,
        seed: &Url,
        max_pages: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<PageRecord>, AnalyzeError> {
        ::log::info!("Crawling entire site: {}", seed);
        let driver = FrontierDriver::new(source, &self.url_filter, self.config.discovery_fetch());
        let urls = driver.crawl(seed, max_pages).await;
        ::log::info!("Found {} URLs to analyze", urls.len());

        if urls.is_empty() {
            return Err(AnalyzeError::NoUrlsFound);
        }

        let mut records = RecordSet::new(self.config.dedupe_records);
        for (i, url) in urls.iter().enumerate() {
            if cancel.is_cancelled() {
                ::log::info!("Crawl cancelled before {}", url);
                break;
            }
            if i > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.pacing_delay()) => {}
                    _ = cancel.cancelled() => {
                        ::log::info!("Crawl cancelled before {}", url);
                        break;
                    }
                }
            }

            ::log::info!("Processing {}/{}: {}", i + 1, urls.len(), url);
            match self.analyze_url(source, url).await {
                Ok(page_records) => page_records.into_iter().for_each(|r| records.push(r)),
                Err(e) => ::log::warn!("Skipping page: {}", e),
            }
        }

        let records = records.into_vec();
        let failed = records.iter().filter(|r| r.error().is_some()).count();
        ::log::info!(
            "Analysis complete. {} succeeded, {} failed.",
            records.len() - failed,
            failed
        );
        Ok(records)
    }

    /// The page's own record first, then one record per harvested subpage
    async fn analyze_url<S: PageSource>(
        &self,
        source: &S,
        url: &Url,
    ) -> Result<Vec<PageRecord>, FetchError> {
        let page = source.fetch(url.as_str(), self.config.page_fetch()).await?;
        let parsed = parsers::parse(&page.html);
        let site_type = self.classifier.classify(&parsed.content).await;

        let discoverer = SubpageDiscoverer::new(
            source,
            &self.url_filter,
            self.config.subpage_fetch(),
            self.config.max_subpages,
        );
        let harvest = discoverer
            .harvest(&page.final_url, &parsed.links, &site_type)
            .await;

        let record = match harvest.failure_note() {
            Some(note) => PageRecord::with_error(
                page.final_url.as_str(),
                site_type.as_str(),
                parsed.content,
                note,
            ),
            None => PageRecord::new(page.final_url.as_str(), site_type.as_str(), parsed.content),
        };

        let mut records = Vec::with_capacity(1 + harvest.records.len());
        records.push(record);
        records.extend(harvest.records);
        Ok(records)
    }
}
