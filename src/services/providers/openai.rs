//! OpenAI chat-completions provider
//!
//! Issues a single non-streaming chat completion per prompt. The model is
//! fixed; only the base URL is configurable (useful for proxies and tests).

use std::sync::Arc;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::providers::{AiProvider, TokenProvider};

const DEFAULT_API_URL: &str = "https://api.openai.com";
const MODEL: &str = "gpt-4o-mini";

pub struct OpenAiProvider {
    http_client: HttpClient,
    tokens: Arc<dyn TokenProvider>,
    api_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl OpenAiProvider {
    pub fn new(tokens: Arc<dyn TokenProvider>, api_url: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            tokens,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl AiProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let token = self.tokens.bearer_token().await?;
        let url = format!("{}/v1/chat/completions", self.api_url);

        let body = ChatRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: 120,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                "OpenAI request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "OpenAI returned status {}: {}",
                status, body
            )));
        }

        let completion: ChatResponse = response.json().await?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::ExternalApi("OpenAI response had no choices".to_string()))?;

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::StaticTokenProvider;

    #[test]
    fn test_default_api_url() {
        let provider = OpenAiProvider::new(Arc::new(StaticTokenProvider::new("k".into())), None);
        assert_eq!(provider.api_url, DEFAULT_API_URL);
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_chat_response_deserialization() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "Because you liked Intro Python."}}
            ]
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.choices[0].message.content,
            "Because you liked Intro Python."
        );
    }
}
