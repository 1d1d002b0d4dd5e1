//! Prompt template and response schema for extracting a table from an image.

use serde_json::{json, Value};

pub const TABLE_EXTRACT_PROMPT_NAME: &str = "table_extract";

pub fn render_table_extract_prompt() -> String {
    "Analyze the image and extract the tabular data. Return the data as a valid JSON array of \
     arrays. The first inner array must represent the column headers, and each subsequent inner \
     array must represent a data row. All values in the arrays should be strings. Make sure the \
     output is only the JSON text."
        .to_string()
}

/// Array of arrays of strings, in the provider's OpenAPI-subset schema dialect.
pub fn table_extract_response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "description": "An array of arrays representing the table. The first inner array is the header row, and subsequent arrays are data rows.",
        "items": {
            "type": "ARRAY",
            "items": {
                "type": "STRING"
            }
        }
    })
}
