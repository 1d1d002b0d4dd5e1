//! Wire contract shared by the relay server and its clients.

use serde::{Deserialize, Serialize};

pub mod paths {
    pub const EXTRACT: &str = "/api/extract";
}

/// Multipart field carrying the uploaded image.
pub const IMAGE_FIELD: &str = "image";

pub const NO_IMAGE_MESSAGE: &str = "No image file uploaded.";
pub const MISSING_API_KEY_MESSAGE: &str = "Server configuration error: Missing API Key.";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method Not Allowed";

/// JSON body of every non-success relay response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
