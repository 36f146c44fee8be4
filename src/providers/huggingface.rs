use crate::error::ProviderError;
use crate::providers::{TextCompletion, read_json};
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant who reasons step-by-step and uses tools when needed.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Hugging Face router client (OpenAI-compatible chat completions)
pub struct HuggingFaceProvider {
    http: reqwest::Client,
    api_token: String,
    model: String,
    base_url: String,
}

impl HuggingFaceProvider {
    pub fn new(api_token: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_token: api_token.into(),
            model: model.into(),
            base_url: "https://router.huggingface.co".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl TextCompletion for HuggingFaceProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.7,
            max_tokens: 512,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await?;

        read_json::<ChatResponse>(response)
            .await?
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse("no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_chat_completion() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer hf-token")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "meta-llama/Llama-3.1-8B-Instruct",
                "max_tokens": 512,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": "What is this site?" }
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "{\"site_type\": \"ecommerce\"}"}}]}"#)
            .create_async()
            .await;

        let provider = HuggingFaceProvider::new("hf-token", "meta-llama/Llama-3.1-8B-Instruct")
            .with_base_url(server.url());
        let text = provider.complete("What is this site?").await.unwrap();

        assert_eq!(text, r#"{"site_type": "ecommerce"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("upstream error")
            .create_async()
            .await;

        let provider = HuggingFaceProvider::new("t", "m").with_base_url(server.url());
        let err = provider.complete("hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 500, .. }));
    }
}
