use crate::config::FetchOptions;
use crate::error::FetchError;
use url::Url;

/// A rendered page, captured before its tab was closed
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL after any redirects
    pub final_url: Url,
    /// Full rendered markup
    pub html: String,
}

/// Anything that can load a URL and hand back its rendered markup.
///
/// Implementations open an isolated page per call and close it before
/// returning. Calls are made one at a time from a single task.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Fetch one page. Non-http(s) URLs are rejected without a network call.
    async fn fetch(&self, url: &str, options: FetchOptions) -> Result<FetchedPage, FetchError>;
}

/// A page source backed by a resource that must be released when the crawl ends.
///
/// `stop` is the orderly path. Implementations also release on drop, so a crawl
/// future that is dropped midway does not leak the resource.
#[allow(async_fn_in_trait)]
pub trait Session: PageSource {
    async fn stop(&mut self);
}
