use clap::{Parser, ValueEnum};
use site_ledger::{AnalyzerConfig, ProviderConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-ledger")]
#[command(about = "Crawl a website, classify it with an LLM and print every page as JSON")]
#[command(version)]
pub struct Args {
    /// Seed URL; only pages on the same host are crawled
    pub url: String,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of pages to discover
    #[arg(short, long)]
    pub max_pages: Option<usize>,

    /// Subpages fetched per analyzed page
    #[arg(long)]
    pub max_subpages: Option<usize>,

    /// Classification backend
    #[arg(short, long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Model name for the chosen backend
    #[arg(long)]
    pub model: Option<String>,

    /// WebDriver endpoint (WEBDRIVER_URL also works)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Emit one record per URL instead of every record produced
    #[arg(long)]
    pub dedupe: bool,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    Gemini,
    Ollama,
    HuggingFace,
}

const DEFAULT_HUGGINGFACE_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.3";

impl Args {
    /// Layer command-line flags over a loaded configuration
    pub fn apply(&self, config: &mut AnalyzerConfig) {
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(max_subpages) = self.max_subpages {
            config.max_subpages = max_subpages;
        }
        if let Some(webdriver_url) = &self.webdriver_url {
            config.webdriver_url = webdriver_url.clone();
        }
        if self.dedupe {
            config.dedupe_records = true;
        }

        match self.provider {
            Some(ProviderArg::Gemini) if !matches!(config.provider, ProviderConfig::Gemini { .. }) => {
                config.provider = ProviderConfig::default();
            }
            Some(ProviderArg::Ollama) if !matches!(config.provider, ProviderConfig::Ollama { .. }) => {
                config.provider = ProviderConfig::ollama();
            }
            Some(ProviderArg::HuggingFace)
                if !matches!(config.provider, ProviderConfig::HuggingFace { .. }) =>
            {
                config.provider = ProviderConfig::hugging_face(DEFAULT_HUGGINGFACE_MODEL);
            }
            _ => {}
        }
        if let Some(model) = &self.model {
            config.provider.set_model(model);
        }
    }
}
