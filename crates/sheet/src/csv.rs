//! CSV serialization for cell grids.
//!
//! Fields are quoted only when they contain the delimiter, a double quote or
//! a newline; inside a quoted field every `"` is doubled and nothing else is
//! escaped. Rows are joined with `\n` and the output has no trailing newline.

use crate::cell::CellValue;

const QUOTE: char = '"';

/// CSV writer options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter (default: ',')
    pub delimiter: char,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions { delimiter: ',' }
    }
}

impl CsvOptions {
    /// Create options for TSV (tab-separated values)
    #[must_use]
    pub fn tsv() -> Self {
        CsvOptions { delimiter: '\t' }
    }

    /// Set the delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Serialize one cell, quoting it if needed.
    #[must_use]
    pub fn serialize_field(&self, value: &CellValue) -> String {
        let text = value.as_str();
        if self.needs_quotes(&text) {
            let escaped = text.replace(QUOTE, "\"\"");
            format!("{QUOTE}{escaped}{QUOTE}")
        } else {
            text
        }
    }

    /// Serialize one row. Every cell yields exactly one field.
    #[must_use]
    pub fn serialize_row(&self, fields: &[CellValue]) -> String {
        let mut line = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push(self.delimiter);
            }
            line.push_str(&self.serialize_field(field));
        }
        line
    }

    /// Serialize a grid, or `None` when there are no rows.
    #[must_use]
    pub fn serialize_grid(&self, rows: &[Vec<CellValue>]) -> Option<String> {
        if rows.is_empty() {
            return None;
        }

        let lines: Vec<String> = rows.iter().map(|row| self.serialize_row(row)).collect();
        Some(lines.join("\n"))
    }

    fn needs_quotes(&self, text: &str) -> bool {
        text.contains(|c: char| c == self.delimiter || c == QUOTE || c == '\n')
    }
}

/// Serialize one cell with the default options.
#[must_use]
pub fn serialize_field(value: &CellValue) -> String {
    CsvOptions::default().serialize_field(value)
}

/// Serialize one row with the default options.
#[must_use]
pub fn serialize_row(fields: &[CellValue]) -> String {
    CsvOptions::default().serialize_row(fields)
}

/// Serialize a grid with the default options.
///
/// Returns `None` for an empty grid so callers can tell "no data" apart from
/// a grid that serializes to the empty string.
#[must_use]
pub fn serialize_grid(rows: &[Vec<CellValue>]) -> Option<String> {
    CsvOptions::default().serialize_grid(rows)
}
