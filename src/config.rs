use crate::error::ConfigError;
use crate::filter::UrlFilterConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Configuration for a site analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// WebDriver URLs tried in order when `webdriver_url` refuses the session
    #[serde(default = "default_fallback_webdriver_urls")]
    pub fallback_webdriver_urls: Vec<String>,

    /// Ask the browser to run without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Hard cap on the number of pages the discovery pass visits
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Subpages fetched per analyzed page
    #[serde(default = "default_max_subpages")]
    pub max_subpages: usize,

    /// Navigation timeout for analyzed (top-level) pages
    #[serde(default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,

    /// Navigation timeout for harvested subpages
    #[serde(default = "default_subpage_timeout_ms")]
    pub subpage_timeout_ms: u64,

    /// Navigation timeout during link discovery
    #[serde(default = "default_discovery_timeout_ms")]
    pub discovery_timeout_ms: u64,

    /// Delay after load for late content on analyzed pages
    #[serde(default = "default_page_settle_ms")]
    pub page_settle_ms: u64,

    #[serde(default = "default_short_settle_ms")]
    pub subpage_settle_ms: u64,

    #[serde(default = "default_short_settle_ms")]
    pub discovery_settle_ms: u64,

    /// Pause between top-level URLs
    #[serde(default = "default_pacing_delay_ms")]
    pub pacing_delay_ms: u64,

    /// Keep only the first record per URL instead of every record produced.
    /// When a page is also another page's subpage, the earlier subpage record wins
    /// and the label it carries is the parent's.
    #[serde(default)]
    pub dedupe_records: bool,

    #[serde(flatten)]
    pub url_filter: UrlFilterConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Retry and prompt settings for site classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Total attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed pause between attempts
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Characters of page text sent to the provider
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,

    /// Label used once every attempt has failed
    #[serde(default = "default_fallback_label")]
    pub fallback_label: String,
}

/// Text-completion backend used for classification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    /// Google Gemini `generateContent`
    Gemini {
        #[serde(default = "default_gemini_model")]
        model: String,
        /// Falls back to `GEMINI_API_KEY`
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_gemini_base_url")]
        base_url: String,
    },

    /// Local Ollama server
    Ollama {
        #[serde(default = "default_ollama_model")]
        model: String,
        #[serde(default = "default_ollama_base_url")]
        base_url: String,
    },

    /// Hugging Face router chat completions
    HuggingFace {
        model: String,
        /// Falls back to `HUGGINGFACE_API_TOKEN`
        #[serde(default)]
        api_token: Option<String>,
        #[serde(default = "default_huggingface_base_url")]
        base_url: String,
    },
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_fallback_webdriver_urls() -> Vec<String> {
    vec![
        "http://localhost:9515".to_string(), // ChromeDriver default
        "http://127.0.0.1:4444".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

fn default_max_pages() -> usize {
    50
}

fn default_max_subpages() -> usize {
    5
}

fn default_page_timeout_ms() -> u64 {
    30_000
}

fn default_subpage_timeout_ms() -> u64 {
    15_000
}

fn default_discovery_timeout_ms() -> u64 {
    20_000
}

fn default_page_settle_ms() -> u64 {
    1_500
}

fn default_short_settle_ms() -> u64 {
    1_000
}

fn default_pacing_delay_ms() -> u64 {
    1_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2_000
}

fn default_excerpt_chars() -> usize {
    3_000
}

fn default_fallback_label() -> String {
    "other".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_ollama_model() -> String {
    "deepseek-r1:1.5b".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_huggingface_base_url() -> String {
    "https://router.huggingface.co".to_string()
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            fallback_webdriver_urls: default_fallback_webdriver_urls(),
            headless: true,
            max_pages: default_max_pages(),
            max_subpages: default_max_subpages(),
            page_timeout_ms: default_page_timeout_ms(),
            subpage_timeout_ms: default_subpage_timeout_ms(),
            discovery_timeout_ms: default_discovery_timeout_ms(),
            page_settle_ms: default_page_settle_ms(),
            subpage_settle_ms: default_short_settle_ms(),
            discovery_settle_ms: default_short_settle_ms(),
            pacing_delay_ms: default_pacing_delay_ms(),
            dedupe_records: false,
            url_filter: UrlFilterConfig::default(),
            classifier: ClassifierConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            excerpt_chars: default_excerpt_chars(),
            fallback_label: default_fallback_label(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::Gemini {
            model: default_gemini_model(),
            api_key: None,
            base_url: default_gemini_base_url(),
        }
    }
}

impl ProviderConfig {
    /// Default Ollama settings
    pub fn ollama() -> Self {
        Self::Ollama {
            model: default_ollama_model(),
            base_url: default_ollama_base_url(),
        }
    }

    /// Hugging Face settings for the given model
    pub fn hugging_face(model: impl Into<String>) -> Self {
        Self::HuggingFace {
            model: model.into(),
            api_token: None,
            base_url: default_huggingface_base_url(),
        }
    }

    /// Replace the model name, keeping every other setting
    pub fn set_model(&mut self, name: impl Into<String>) {
        match self {
            Self::Gemini { model, .. }
            | Self::Ollama { model, .. }
            | Self::HuggingFace { model, .. } => *model = name.into(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply `WEBDRIVER_URL`, `GEMINI_API_KEY` and `HUGGINGFACE_API_TOKEN` from the environment.
    ///
    /// Values already set in the configuration take precedence over credentials,
    /// while a non-empty `WEBDRIVER_URL` always wins.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(webdriver_url) = get("WEBDRIVER_URL") {
            self.webdriver_url = webdriver_url;
        }

        match &mut self.provider {
            ProviderConfig::Gemini { api_key, .. } if api_key.is_none() => {
                *api_key = get("GEMINI_API_KEY");
            }
            ProviderConfig::HuggingFace { api_token, .. } if api_token.is_none() => {
                *api_token = get("HUGGINGFACE_API_TOKEN");
            }
            _ => {}
        }
    }

    pub fn page_fetch(&self) -> FetchOptions {
        FetchOptions::new(self.page_timeout_ms, self.page_settle_ms)
    }

    pub fn subpage_fetch(&self) -> FetchOptions {
        FetchOptions::new(self.subpage_timeout_ms, self.subpage_settle_ms)
    }

    pub fn discovery_fetch(&self) -> FetchOptions {
        FetchOptions::new(self.discovery_timeout_ms, self.discovery_settle_ms)
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }
}

/// Timing for one page fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Navigation timeout
    pub timeout: Duration,
    /// Pause after load before the markup is captured
    pub settle: Duration,
}

impl FetchOptions {
    pub fn new(timeout_ms: u64, settle_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            settle: Duration::from_millis(settle_ms),
        }
    }
}
