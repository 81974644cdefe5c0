//! Google Gemini provider
//!
//! Uses the generateContent REST endpoint; the API key travels as a query
//! parameter rather than a bearer header.

use std::sync::Arc;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::providers::{AiProvider, TokenProvider};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";
const MODEL: &str = "gemini-1.5-flash";

pub struct GeminiProvider {
    http_client: HttpClient,
    tokens: Arc<dyn TokenProvider>,
    api_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

impl GeminiProvider {
    pub fn new(tokens: Arc<dyn TokenProvider>, api_url: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            tokens,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl AiProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let key = self.tokens.bearer_token().await?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, MODEL
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                "Gemini request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Gemini returned status {}: {}",
                status, body
            )));
        }

        let generated: GenerateResponse = response.json().await?;
        let text = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| {
                AppError::ExternalApi("Gemini response had no candidates".to_string())
            })?;

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::StaticTokenProvider;

    #[test]
    fn test_default_api_url() {
        let provider = GeminiProvider::new(Arc::new(StaticTokenProvider::new("k".into())), None);
        assert_eq!(provider.api_url, DEFAULT_API_URL);
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn test_generate_response_deserialization() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "A natural next step."}], "role": "model"}}
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.candidates[0].content.parts[0].text, "A natural next step.");
    }
}
