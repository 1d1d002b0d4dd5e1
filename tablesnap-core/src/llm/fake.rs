//! Fake LLM provider for testing.
//!
//! Returns a canned response (or a canned failure) without network access,
//! and counts how many times it was called.

use super::{LlmError, LlmProvider, VisionRequest};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
enum FakeOutcome {
    Respond(String),
    Fail(String),
}

/// A fake LLM provider for testing.
#[derive(Debug)]
pub struct FakeProvider {
    outcome: FakeOutcome,
    calls: AtomicUsize,
}

impl Default for FakeProvider {
    /// Responds with an empty table.
    fn default() -> Self {
        Self::with_response("[]")
    }
}

impl FakeProvider {
    /// Create a FakeProvider that always returns `response`.
    pub fn with_response(response: &str) -> Self {
        Self {
            outcome: FakeOutcome::Respond(response.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a FakeProvider whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            outcome: FakeOutcome::Fail(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of completed `complete` calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, request: &VisionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if request.image.data.is_empty() {
            return Err(LlmError::RequestFailed(
                "FakeProvider: empty image payload".to_string(),
            ));
        }

        match &self.outcome {
            FakeOutcome::Respond(response) => Ok(response.clone()),
            FakeOutcome::Fail(message) => Err(LlmError::RequestFailed(message.clone())),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
