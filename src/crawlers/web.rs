use crate::config::{AnalyzerConfig, FetchOptions};
use crate::crawlers::crawler::{FetchedPage, PageSource, Session};
use crate::error::{FetchError, FetchFailure, SessionStartError};
use crate::filter;
use fantoccini::error::CmdError;
use fantoccini::wd::{Capabilities, TimeoutConfiguration, WindowHandle};
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Extra time granted to a navigation command beyond the browser-side page load timeout
const COMMAND_GRACE: Duration = Duration::from_secs(5);

/// Where and how to launch the browser
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub webdriver_url: String,
    pub fallback_webdriver_urls: Vec<String>,
    pub headless: bool,
}

impl From<&AnalyzerConfig> for SessionConfig {
    fn from(config: &AnalyzerConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            fallback_webdriver_urls: config.fallback_webdriver_urls.clone(),
            headless: config.headless,
        }
    }
}

/// One WebDriver session (the rendering engine) and its home window (the browsing context).
///
/// Every page is fetched in a fresh tab that is closed before `fetch` returns.
/// `stop` should be awaited once per successful `start`. A session dropped without
/// it is closed in the background on the current tokio runtime.
pub struct BrowserSession {
    client: Option<Client>,
    home: Option<WindowHandle>,
}

impl BrowserSession {
    /// Launch the browser through WebDriver.
    ///
    /// Tries `webdriver_url` first, then each fallback. If the session opens but its
    /// home window cannot be read, the session is closed again before failing.
    pub async fn start(config: &SessionConfig) -> Result<Self, SessionStartError> {
        let client = connect_to_webdriver(config).await?;

        match client.window().await {
            Ok(home) => {
                ::log::info!("Browser session started");
                Ok(Self {
                    client: Some(client),
                    home: Some(home),
                })
            }
            Err(e) => {
                if let Err(close_err) = client.close().await {
                    ::log::warn!("Failed to close half-started session: {}", close_err);
                }
                Err(SessionStartError {
                    webdriver_url: config.webdriver_url.clone(),
                    reason: format!("no browsing context: {e}"),
                })
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.client.is_some()
    }

    /// Release the browsing context, then the engine. Safe to call when either is already gone.
    pub async fn stop(&mut self) {
        // The home window closes with the session; forgetting the handle releases the context.
        self.home.take();

        if let Some(client) = self.client.take() {
            match client.close().await {
                Ok(()) => ::log::info!("Browser session closed"),
                Err(e) => ::log::warn!("Failed to close browser session: {}", e),
            }
        }
    }

    async fn load(
        client: &Client,
        url: &Url,
        options: FetchOptions,
    ) -> Result<FetchedPage, FetchFailure> {
        let timeout_ms = options.timeout.as_millis() as u64;

        client
            .update_timeouts(TimeoutConfiguration::new(None, Some(options.timeout), None))
            .await
            .map_err(|e| command_failure(e, timeout_ms))?;

        match tokio::time::timeout(options.timeout + COMMAND_GRACE, client.goto(url.as_str())).await
        {
            Ok(result) => result.map_err(|e| command_failure(e, timeout_ms))?,
            Err(_) => return Err(FetchFailure::Timeout(timeout_ms)),
        }

        // Give late-loading content a moment
        tokio::time::sleep(options.settle).await;

        let final_url = client
            .current_url()
            .await
            .map_err(|e| command_failure(e, timeout_ms))?;
        let html = client
            .source()
            .await
            .map_err(|e| command_failure(e, timeout_ms))?;

        Ok(FetchedPage {
            final_url,
            html,
        })
    }
}

impl PageSource for BrowserSession {
    async fn fetch(&self, url: &str, options: FetchOptions) -> Result<FetchedPage, FetchError> {
        let target = filter::validate_url(url).map_err(|e| FetchError::new(url, e))?;
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| FetchError::new(url, FetchFailure::NoSession))?;

        let tab = client
            .new_window(true)
            .await
            .map_err(|e| FetchError::new(url, FetchFailure::Transport(e.to_string())))?;
        if let Err(e) = client.switch_to_window(tab.handle).await {
            return Err(FetchError::new(url, FetchFailure::Transport(e.to_string())));
        }

        ::log::debug!("Fetching {} (timeout {:?})", url, options.timeout);
        let outcome = Self::load(client, &target, options).await;

        // Close the tab whatever happened to the navigation
        if let Err(e) = client.close_window().await {
            ::log::warn!("Failed to close tab for {}: {}", url, e);
        }
        if let Some(home) = &self.home {
            if let Err(e) = client.switch_to_window(home.clone()).await {
                ::log::warn!("Failed to return to the home window: {}", e);
            }
        }

        outcome.map_err(|cause| FetchError::new(url, cause))
    }
}

impl Session for BrowserSession {
    async fn stop(&mut self) {
        BrowserSession::stop(self).await;
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.home.take();
        let Some(client) = self.client.take() else {
            return;
        };

        ::log::warn!("Browser session dropped without stop(); closing it in the background");
        let scheduled = spawn_release(async move {
            if let Err(e) = client.close().await {
                ::log::warn!("Failed to close browser session: {}", e);
            }
        });
        if !scheduled {
            ::log::error!("No tokio runtime to close the browser session; the WebDriver session may leak");
        }
    }
}

/// Schedule `release` on the current tokio runtime from a synchronous context.
/// Returns false when there is no runtime to run it on.
fn spawn_release<F>(release: F) -> bool
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(release);
            true
        }
        Err(_) => false,
    }
}

/// Capabilities asking for headless Chrome/Firefox and an "eager" load strategy,
/// so navigation returns once the DOM content has loaded.
fn capabilities(headless: bool) -> Capabilities {
    let mut caps = Capabilities::new();
    caps.insert("pageLoadStrategy".to_string(), json!("eager"));
    if headless {
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": ["--headless=new", "--disable-gpu", "--no-sandbox"] }),
        );
        caps.insert(
            "moz:firefoxOptions".to_string(),
            json!({ "args": ["-headless"] }),
        );
    }
    caps
}

/// Connects to the WebDriver instance, falling back to the alternative URLs
async fn connect_to_webdriver(config: &SessionConfig) -> Result<Client, SessionStartError> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(capabilities(config.headless));

    let first_error = match builder.connect(&config.webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", config.webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                config.webdriver_url,
                e
            );
            e.to_string()
        }
    };

    for url in &config.fallback_webdriver_urls {
        if *url == config.webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = builder.connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(SessionStartError {
        webdriver_url: config.webdriver_url.clone(),
        reason: first_error,
    })
}

fn command_failure(error: CmdError, timeout_ms: u64) -> FetchFailure {
    let message = error.to_string();
    if message.to_lowercase().contains("timeout") {
        FetchFailure::Timeout(timeout_ms)
    } else {
        FetchFailure::Transport(message)
    }
}
