//! Text-completion backends used for site classification

pub mod gemini;
pub mod huggingface;
pub mod ollama;

use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError};
use serde::de::DeserializeOwned;

pub use gemini::GeminiProvider;
pub use huggingface::HuggingFaceProvider;
pub use ollama::OllamaProvider;

/// Anything that turns a prompt into a completion
#[allow(async_fn_in_trait)]
pub trait TextCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// The provider chosen by configuration
pub enum AnyProvider {
    Gemini(GeminiProvider),
    Ollama(OllamaProvider),
    HuggingFace(HuggingFaceProvider),
}

impl AnyProvider {
    /// Build the configured provider. Hosted providers need a credential.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ConfigError> {
        Ok(match config {
            ProviderConfig::Gemini {
                model,
                api_key,
                base_url,
            } => {
                let api_key = api_key
                    .clone()
                    .ok_or(ConfigError::MissingCredential("GEMINI_API_KEY"))?;
                Self::Gemini(GeminiProvider::new(api_key, model.clone()).with_base_url(base_url))
            }
            ProviderConfig::Ollama { model, base_url } => {
                Self::Ollama(OllamaProvider::new(model.clone()).with_base_url(base_url))
            }
            ProviderConfig::HuggingFace {
                model,
                api_token,
                base_url,
            } => {
                let api_token = api_token
                    .clone()
                    .ok_or(ConfigError::MissingCredential("HUGGINGFACE_API_TOKEN"))?;
                Self::HuggingFace(
                    HuggingFaceProvider::new(api_token, model.clone()).with_base_url(base_url),
                )
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gemini(_) => "gemini",
            Self::Ollama(_) => "ollama",
            Self::HuggingFace(_) => "hugging-face",
        }
    }
}

impl TextCompletion for AnyProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        match self {
            Self::Gemini(p) => p.complete(prompt).await,
            Self::Ollama(p) => p.complete(prompt).await,
            Self::HuggingFace(p) => p.complete(prompt).await,
        }
    }
}

/// Decode a successful JSON response, turning any non-2xx status into an error
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json::<T>().await?)
}
