//! Client for the relay's extraction endpoint.
//!
//! Every failure, whatever its origin, comes back as a [`ClientError`] whose
//! message is ready to show to an end user. Raw server bodies that are not
//! part of the contract are logged, never put into the message.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use thiserror::Error;

use crate::api::{paths, ErrorBody, IMAGE_FIELD, MISSING_API_KEY_MESSAGE};
use crate::table::Table;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

const TRANSPORT_MESSAGE: &str = "An unknown error occurred.";
const UNKNOWN_EXTRACTION_MESSAGE: &str = "An unknown error occurred during extraction.";
const UNEXPECTED_RESPONSE_MESSAGE: &str = "Server returned an unexpected error.";
const EMPTY_IMAGE_MESSAGE: &str = "No image data to upload.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// The relay could not be reached or the connection broke.
    Transport,
    /// The upload was rejected as invalid.
    ClientInput,
    /// The relay is missing its credential.
    ServerConfig,
    /// The AI call failed or returned something that is not a table.
    Extraction,
    /// The relay answered with a body outside the contract.
    ResponseParse,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
}

impl ClientError {
    fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Configuration for [`RelayClient`].
#[derive(Debug, Clone)]
pub struct RelayClientBuilder {
    base_url: String,
    timeout: Option<Duration>,
}

impl Default for RelayClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            timeout: None,
        }
    }

    /// Set the relay base URL, e.g. "http://localhost:3000".
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a per-request timeout. None (the default) waits indefinitely.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> RelayClient {
        RelayClient {
            http: reqwest::Client::new(),
            base_url: self.base_url.trim_end_matches('/').to_string(),
            timeout: self.timeout,
        }
    }
}

/// Uploads images to the relay and returns the extracted table.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        RelayClientBuilder::new().base_url(base_url).build()
    }

    pub fn builder() -> RelayClientBuilder {
        RelayClientBuilder::new()
    }

    pub fn extract_url(&self) -> String {
        format!("{}{}", self.base_url, paths::EXTRACT)
    }

    /// Upload `image` and return the table the relay extracted from it.
    ///
    /// Makes one request and never retries.
    pub async fn extract(&self, image: Vec<u8>, mime_type: &str) -> Result<Table, ClientError> {
        if image.is_empty() {
            return Err(ClientError::new(
                ClientErrorKind::ClientInput,
                EMPTY_IMAGE_MESSAGE,
            ));
        }

        let part = Part::bytes(image)
            .file_name(IMAGE_FIELD)
            .mime_str(mime_type)
            .map_err(|e| {
                ClientError::new(
                    ClientErrorKind::ClientInput,
                    format!("Invalid MIME type '{}': {}", mime_type, e),
                )
            })?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let mut request = self.http.post(self.extract_url()).multipart(form);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "Error calling extraction API");
            ClientError::new(ClientErrorKind::Transport, TRANSPORT_MESSAGE)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to read extraction API response");
            ClientError::new(ClientErrorKind::Transport, TRANSPORT_MESSAGE)
        })?;

        if status.is_success() {
            return serde_json::from_str::<Table>(&body).map_err(|e| {
                tracing::error!(error = %e, body = %body, "Success response is not a table");
                ClientError::new(ClientErrorKind::ResponseParse, UNEXPECTED_RESPONSE_MESSAGE)
            });
        }

        Err(error_from_response(status, &body))
    }
}

fn error_from_response(status: StatusCode, body: &str) -> ClientError {
    let json: serde_json::Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(_) => {
            tracing::error!(status = %status, body = %body, "Non-JSON error response from server");
            return ClientError::new(ClientErrorKind::ResponseParse, UNEXPECTED_RESPONSE_MESSAGE);
        }
    };

    let message = serde_json::from_value::<ErrorBody>(json)
        .ok()
        .map(|body| body.error)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| UNKNOWN_EXTRACTION_MESSAGE.to_string());

    let kind = if status.is_client_error() {
        ClientErrorKind::ClientInput
    } else if message == MISSING_API_KEY_MESSAGE {
        ClientErrorKind::ServerConfig
    } else {
        ClientErrorKind::Extraction
    };

    tracing::warn!(status = %status, error = %message, "Extraction request failed");
    ClientError::new(kind, message)
}
