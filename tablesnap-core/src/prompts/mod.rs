//! AI prompt templates.

pub mod table_extract;

pub use table_extract::{
    render_table_extract_prompt, table_extract_response_schema, TABLE_EXTRACT_PROMPT_NAME,
};
