//! AI text-generation provider abstraction
//!
//! Pluggable backends for the optional explanation-enrichment step. Each
//! provider implements a single text-generation call; the scoring engine
//! never branches on provider identity, and every result is complete
//! without one.

use std::sync::Arc;

use crate::{config::Config, error::AppResult};

pub mod gemini;
pub mod openai;

/// Trait for AI text-generation providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    /// Generate a short text completion for the prompt.
    async fn generate(&self, prompt: &str) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for credential sources feeding an [`AiProvider`]
///
/// Kept behind a trait so a refreshing OAuth source can replace the static
/// key without touching the providers.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> AppResult<String>;
}

/// Token source backed by a fixed API key from configuration
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> AppResult<String> {
        Ok(self.token.clone())
    }
}

/// Builds the configured provider, if any.
///
/// Selection happens here at the boundary; unset configuration disables
/// enrichment entirely.
pub fn build_provider(config: &Config) -> anyhow::Result<Option<Arc<dyn AiProvider>>> {
    let Some(name) = config.ai_provider.as_deref() else {
        return Ok(None);
    };

    let api_key = config
        .ai_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("AI_API_KEY is required when AI_PROVIDER is set"))?;
    let tokens = Arc::new(StaticTokenProvider::new(api_key));

    let provider: Arc<dyn AiProvider> = match name {
        "openai" => Arc::new(openai::OpenAiProvider::new(
            tokens,
            config.ai_api_url.clone(),
        )),
        "gemini" => Arc::new(gemini::GeminiProvider::new(
            tokens,
            config.ai_api_url.clone(),
        )),
        other => anyhow::bail!("Unknown AI provider '{}'", other),
    };

    tracing::info!(provider = provider.name(), "AI enrichment enabled");
    Ok(Some(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: Option<&str>, key: Option<&str>) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ai_provider: provider.map(str::to_string),
            ai_api_key: key.map(str::to_string),
            ai_api_url: None,
        }
    }

    #[test]
    fn test_no_provider_configured() {
        let result = build_provider(&config(None, None)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_provider_requires_api_key() {
        assert!(build_provider(&config(Some("openai"), None)).is_err());
    }

    #[test]
    fn test_known_providers_construct() {
        let openai = build_provider(&config(Some("openai"), Some("k"))).unwrap();
        assert_eq!(openai.unwrap().name(), "openai");

        let gemini = build_provider(&config(Some("gemini"), Some("k"))).unwrap();
        assert_eq!(gemini.unwrap().name(), "gemini");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(build_provider(&config(Some("acme"), Some("k"))).is_err());
    }

    #[tokio::test]
    async fn test_static_token_provider_returns_key() {
        let tokens = StaticTokenProvider::new("secret".to_string());
        assert_eq!(tokens.bearer_token().await.unwrap(), "secret");
    }
}
