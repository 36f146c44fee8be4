//! The single operation exposed to agent frameworks: crawl a site and return text.

use crate::analyzer::Analyzer;
use crate::error::AnalyzeError;
use crate::providers::TextCompletion;
use crate::results::{self, PageRecord};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

pub const TOOL_NAME: &str = "CrawlAndAnalyzeWebsite";

pub const TOOL_DESCRIPTION: &str = "Crawl and analyze a full website starting from a given URL. \
     Returns a JSON array with one entry per page: its URL, the detected site type, \
     the extracted page content and any processing errors.";

/// Name and description advertised to the calling agent
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
}

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: TOOL_NAME,
        description: TOOL_DESCRIPTION,
    }
}

/// Crawl `url` with the analyzer's configured page cap and render the outcome as text.
///
/// Never fails: errors come back as a descriptive string instead of JSON.
pub async fn crawl_and_analyze_website<P: TextCompletion>(
    analyzer: &Analyzer<P>,
    url: &str,
) -> String {
    crawl_and_analyze_website_with_cancel(analyzer, url, &CancellationToken::new()).await
}

pub async fn crawl_and_analyze_website_with_cancel<P: TextCompletion>(
    analyzer: &Analyzer<P>,
    url: &str,
    cancel: &CancellationToken,
) -> String {
    let max_pages = analyzer.config().max_pages;
    let outcome = analyzer.analyze_with_cancel(url, max_pages, cancel).await;
    render_outcome(url, outcome)
}

pub fn render_outcome(url: &str, outcome: Result<Vec<PageRecord>, AnalyzeError>) -> String {
    let failure = match outcome.and_then(|records| Ok(results::to_json(&records)?)) {
        Ok(json) => return json,
        Err(e) => e,
    };

    match failure {
        AnalyzeError::NoUrlsFound => {
            ::log::warn!("No URLs found while crawling {}", url);
            failure.to_string()
        }
        e => {
            ::log::error!("Crawl of {} failed: {}", url, e);
            format!("Error crawling and analyzing {url}: {e}")
        }
    }
}
