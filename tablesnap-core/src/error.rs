use thiserror::Error;

use crate::llm::LlmError;

/// The model answered, but not with an array of arrays of strings.
#[derive(Error, Debug)]
pub enum TableFormatError {
    #[error("AI response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("AI response is not in the expected table format.")]
    NotATable,
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("AI provider failed: {0}")]
    Provider(#[from] LlmError),

    #[error("{0}")]
    Format(#[from] TableFormatError),
}

impl ExtractError {
    /// Message safe to hand to an end user. Never includes the cause.
    pub fn public_message(&self) -> &'static str {
        crate::extract::EXTRACTION_FAILED_MESSAGE
    }
}
