//! Table model and its display/export forms.
//!
//! A [`Table`] is a list of rows of string cells. Row 0 holds the headers.
//! Rows are not required to have the same length; display code aligns them
//! without touching the stored data or the TSV export.

use serde::{Deserialize, Serialize};

/// Shown under the headers when the table has no data rows.
pub const HEADERS_ONLY_NOTICE: &str =
    "No data rows were extracted from the image. Only headers were found.";

/// Extracted table data. Serializes as a bare JSON array of arrays of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Split into headers and data rows. `None` means there is nothing to render.
    pub fn to_display(&self) -> Option<TableView<'_>> {
        let (headers, rows) = self.rows.split_first()?;
        Some(TableView { headers, rows })
    }

    /// Tab-separated export, header row included, for pasting into spreadsheets.
    ///
    /// Cells containing tabs or newlines are written as-is and will break the
    /// row/column structure on paste.
    pub fn to_clipboard_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Borrowed headers/rows view of a non-empty table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableView<'a> {
    pub headers: &'a [String],
    pub rows: &'a [Vec<String>],
}

impl TableView<'_> {
    pub fn is_header_only(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest row, headers included.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    /// Render as an aligned plain-text grid. Short rows end early.
    pub fn render_text(&self) -> String {
        let columns = self.column_count();
        let mut widths = vec![0usize; columns];
        for row in std::iter::once(self.headers).chain(self.rows.iter().map(Vec::as_slice)) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_row(&mut out, self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_row(&mut out, &rule, &widths);
        for row in self.rows {
            push_row(&mut out, row, &widths);
        }

        if self.is_header_only() {
            out.push('\n');
            out.push_str(HEADERS_ONLY_NOTICE);
            out.push('\n');
        }

        out
    }
}

fn push_row(out: &mut String, row: &[String], widths: &[usize]) {
    let cells: Vec<String> = row
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    out.push_str(cells.join(" | ").trim_end());
    out.push('\n');
}
