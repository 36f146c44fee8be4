use crate::error::ProviderError;
use crate::providers::{TextCompletion, read_json};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for a local Ollama server's `/api/generate`
pub struct OllamaProvider {
    http: reqwest::Client,
    model: String,
    base_url: String,
}

impl OllamaProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            model: model.into(),
            base_url: "http://localhost:11434".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl TextCompletion for OllamaProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        Ok(read_json::<GenerateResponse>(response).await?.response)
    }
}
