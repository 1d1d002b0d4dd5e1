//! Output forms of an extracted table.

use std::fmt;
use std::str::FromStr;

use crate::table::Table;

/// Shown instead of a table when nothing was extracted.
pub const NOTHING_EXTRACTED_NOTICE: &str = "No table data was extracted from the image.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned grid for terminals.
    #[default]
    Text,
    /// Tab-separated values, ready to paste into a spreadsheet.
    Tsv,
    /// The table as a JSON array of arrays.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "tsv" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown format '{}', expected one of: text, tsv, json",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Tsv => "tsv",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

/// Render `table` in the requested format.
///
/// In `Text` mode an empty table yields a notice rather than an empty grid.
/// `Tsv` and `Json` always reflect the data exactly.
pub fn render(table: &Table, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(match table.to_display() {
            Some(view) => view.render_text(),
            None => format!("{}\n", NOTHING_EXTRACTED_NOTICE),
        }),
        OutputFormat::Tsv => Ok(table.to_clipboard_text()),
        OutputFormat::Json => serde_json::to_string_pretty(table),
    }
}
