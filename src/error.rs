use thiserror::Error;

/// The rendering engine could not be launched or reached.
#[derive(Debug, Error)]
#[error("failed to start browser session at {webdriver_url}: {reason}")]
pub struct SessionStartError {
    pub webdriver_url: String,
    pub reason: String,
}

/// Why a single page fetch failed
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error(transparent)]
    InvalidUrl(#[from] InvalidUrlError),

    #[error("navigation timed out after {0} ms")]
    Timeout(u64),

    #[error("webdriver command failed: {0}")]
    Transport(String),

    #[error("browser session is not running")]
    NoSession,
}

/// A page that could not be fetched. Always recoverable by skipping the page.
#[derive(Debug, Error)]
#[error("failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    #[source]
    pub cause: FetchFailure,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: impl Into<FetchFailure>) -> Self {
        Self {
            url: url.into(),
            cause: cause.into(),
        }
    }
}

/// A URL that is malformed or not http(s)
#[derive(Debug, Error)]
pub enum InvalidUrlError {
    #[error("malformed URL {url:?}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme {scheme:?} in {url}")]
    UnsupportedScheme { url: String, scheme: String },
}

/// Failure reported by a text-completion backend
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected provider response: {0}")]
    MalformedResponse(String),
}

/// One failed classification attempt
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("no JSON object in response")]
    NoJsonObject,

    #[error("invalid JSON in response: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("response JSON has no usable site_type")]
    MissingLabel,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid URL pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("missing {0}: set it in the config file or the environment")]
    MissingCredential(&'static str),
}

/// Crawl-level failure. Everything below the session is recovered per page.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    SessionStart(#[from] SessionStartError),

    #[error("No URLs found during crawling")]
    NoUrlsFound,

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}
