use crate::cell::CellValue;
use crate::csv::CsvOptions;

/// Characters that would split a tab name into path components.
const PATH_SEPARATORS: [char; 2] = ['/', '\\'];

/// A named tab and its cell grid (rows may differ in length)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tab {
    name: String,
    rows: Vec<Vec<CellValue>>,
}

impl Tab {
    /// Create a tab from a name and its rows
    #[must_use]
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Tab {
            name: name.into(),
            rows,
        }
    }

    /// Create a tab from anything convertible into cell values
    #[must_use]
    pub fn from_data<T: Into<CellValue>>(name: impl Into<String>, data: Vec<Vec<T>>) -> Self {
        let rows = data
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self::new(name, rows)
    }

    /// Get the tab name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the rows
    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Get the number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the tab has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The CSV file name for this tab, e.g. `Q1_Report.csv` for `Q1/Report`
    #[must_use]
    pub fn file_name(&self) -> String {
        csv_file_name(&self.name)
    }

    /// Serialize to CSV, or `None` if the tab has no rows
    #[must_use]
    pub fn to_csv(&self) -> Option<String> {
        self.to_csv_with_options(CsvOptions::default())
    }

    /// Serialize to CSV with custom options
    #[must_use]
    pub fn to_csv_with_options(&self, options: CsvOptions) -> Option<String> {
        options.serialize_grid(&self.rows)
    }
}

/// Replace path separators in a tab name so it is usable as a file stem.
#[must_use]
pub fn sanitize_file_stem(name: &str) -> String {
    name.replace(PATH_SEPARATORS, "_")
}

/// `<sanitized name>.csv`
#[must_use]
pub fn csv_file_name(name: &str) -> String {
    format!("{}.csv", sanitize_file_stem(name))
}
