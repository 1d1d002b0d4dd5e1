pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod image;
pub mod llm;
pub mod present;
pub mod prompts;
pub mod table;

pub use api::ErrorBody;
pub use client::{ClientError, ClientErrorKind, RelayClient, RelayClientBuilder};
pub use config::{AiConfig, ConfigError, ProviderKind};
pub use error::{ExtractError, TableFormatError};
pub use extract::{extract_table, parse_table_response, EXTRACTION_FAILED_MESSAGE};
pub use crate::image::{detect_mime_type, resolve_mime_type, DEFAULT_MIME_TYPE, MAX_FILE_SIZE};
pub use llm::{ImageData, LlmError, LlmProvider, VisionRequest};
pub use present::{render, OutputFormat};
pub use table::{Table, TableView};
