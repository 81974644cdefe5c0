use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// AI provider for optional explanation enrichment ("openai" or
    /// "gemini"); unset disables enrichment entirely
    #[serde(default)]
    pub ai_provider: Option<String>,

    /// Credential handed to the provider's token source
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// Override for the provider API base URL (defaults per provider)
    #[serde(default)]
    pub ai_api_url: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
