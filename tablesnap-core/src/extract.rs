//! Table extraction from an image using a vision model.

use serde_json::Value;

use crate::error::{ExtractError, TableFormatError};
use crate::llm::{ImageData, LlmProvider, VisionRequest};
use crate::prompts::{
    render_table_extract_prompt, table_extract_response_schema, TABLE_EXTRACT_PROMPT_NAME,
};
use crate::table::Table;

/// The only failure message callers of the relay ever see for extraction errors.
pub const EXTRACTION_FAILED_MESSAGE: &str = "Failed to extract data from AI service.";

/// Ask the model for the table in `image` and validate its answer.
///
/// Makes exactly one provider call. The specific failure is logged here; callers
/// should surface [`ExtractError::public_message`] rather than the error itself.
pub async fn extract_table(
    provider: &dyn LlmProvider,
    image: ImageData,
) -> Result<Table, ExtractError> {
    let request = VisionRequest {
        prompt: render_table_extract_prompt(),
        image,
        response_schema: Some(table_extract_response_schema()),
    };

    tracing::debug!(
        prompt_name = TABLE_EXTRACT_PROMPT_NAME,
        provider = provider.provider_name(),
        model = provider.model_name(),
        "Requesting table extraction"
    );

    let result = match provider.complete(&request).await {
        Ok(text) => parse_table_response(&text).map_err(ExtractError::from),
        Err(e) => Err(ExtractError::from(e)),
    };

    match &result {
        Ok(table) => tracing::info!(
            rows = table.rows().len(),
            provider = provider.provider_name(),
            "Table extracted"
        ),
        Err(e) => tracing::error!(
            error = %e,
            provider = provider.provider_name(),
            "Error in AI extraction call"
        ),
    }

    result
}

/// Parse model output into a [`Table`].
///
/// The top level must be an array and every element must itself be an array.
/// Strings are kept as-is, other scalars are stringified and `null` becomes an
/// empty cell. Nested arrays or objects inside a row are rejected.
pub fn parse_table_response(text: &str) -> Result<Table, TableFormatError> {
    let value: Value = serde_json::from_str(text.trim())?;

    let Value::Array(rows) = value else {
        return Err(TableFormatError::NotATable);
    };

    rows.into_iter()
        .map(|row| match row {
            Value::Array(cells) => cells
                .into_iter()
                .map(cell_to_string)
                .collect::<Result<Vec<_>, _>>(),
            _ => Err(TableFormatError::NotATable),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Table::new)
}

fn cell_to_string(cell: Value) -> Result<String, TableFormatError> {
    match cell {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Array(_) | Value::Object(_) => Err(TableFormatError::NotATable),
    }
}
