//! LLM provider abstraction for table extraction.
//!
//! Providers take a prompt, one image and an optional response schema, and
//! return the model's raw text. Parsing that text into a table happens in
//! [`crate::extract`], so providers can be swapped without touching callers.

mod fake;
mod gemini;

pub use fake::FakeProvider;
pub use gemini::GeminiProvider;

use async_trait::async_trait;
use base64::Engine;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{AiConfig, ProviderKind};

/// Error type for LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// An image to send to a vision model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl ImageData {
    pub fn new(data: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// A single-turn prompt with an attached image.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub prompt: String,
    pub image: ImageData,
    /// JSON schema the response must follow. When set, the provider asks for
    /// JSON-only output.
    pub response_schema: Option<serde_json::Value>,
}

/// Trait for LLM providers.
///
/// Implementations hold no per-request state and are shared across requests.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send the request and return the model's text response.
    async fn complete(&self, request: &VisionRequest) -> Result<String, LlmError>;

    /// Get the provider name (e.g., "gemini", "fake").
    fn provider_name(&self) -> &'static str;

    /// Get the model name (e.g., "gemini-2.5-flash").
    fn model_name(&self) -> &str;
}

/// Build the provider described by `config`.
pub fn create_provider(config: &AiConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.provider {
        ProviderKind::Fake => Ok(Arc::new(FakeProvider::default())),
        ProviderKind::Gemini => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| LlmError::NotConfigured("API_KEY not set".to_string()))?;
            Ok(Arc::new(GeminiProvider::new(
                api_key,
                config.model.clone(),
                config.base_url.clone(),
            )))
        }
    }
}
