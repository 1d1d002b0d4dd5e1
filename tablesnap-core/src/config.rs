//! AI configuration from environment variables.

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model to use.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown AI provider: {0}")]
    UnknownProvider(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderKind {
    #[default]
    Gemini,
    Fake,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "fake" => Ok(Self::Fake),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// AI client configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: ProviderKind,
    /// API key for the provider. Missing is allowed here; it is reported per
    /// request by the relay rather than at startup.
    pub api_key: Option<String>,
    /// Model name (e.g., "gemini-2.5-flash").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl AiConfig {
    /// Load configuration from environment variables.
    ///
    /// - `API_KEY` or `GEMINI_API_KEY`: API key for Gemini
    /// - `TABLESNAP_AI_PROVIDER`: "gemini" (default) or "fake"
    /// - `TABLESNAP_AI_MODEL`: Model name (default: "gemini-2.5-flash")
    /// - `TABLESNAP_AI_BASE_URL`: API base URL
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = match env::var("TABLESNAP_AI_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => ProviderKind::default(),
        };

        let api_key = env::var("API_KEY")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        let model = env::var("TABLESNAP_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let base_url =
            env::var("TABLESNAP_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            provider,
            api_key,
            model,
            base_url,
        })
    }
}
