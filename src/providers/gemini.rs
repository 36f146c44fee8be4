use crate::error::ProviderError;
use crate::providers::{TextCompletion, read_json};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all parts concatenated
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text = content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<String>();
        Some(text)
    }
}

/// Google Gemini `generateContent` client
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl TextCompletion for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        ::log::debug!("Generating content from model {}", self.model);
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        read_json::<GenerateContentResponse>(response)
            .await?
            .text()
            .ok_or_else(|| ProviderError::MalformedResponse("no candidates".to_string()))
    }
}
