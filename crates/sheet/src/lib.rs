//! Tabs, cells and CSV output for tabdump
//!
//! Provides the value model for spreadsheet tabs fetched from the API and the
//! CSV serializer used to write them out.
//!
//! # Examples
//!
//! ## Serializing a grid
//!
//! ```
//! use tabdump_sheet::{serialize_grid, CellValue};
//!
//! let grid = vec![
//!     vec![CellValue::from("a"), CellValue::from("b,c")],
//!     vec![CellValue::from("d\"e"), CellValue::from("f")],
//! ];
//!
//! assert_eq!(serialize_grid(&grid).unwrap(), "a,\"b,c\"\n\"d\"\"e\",f");
//! assert_eq!(serialize_grid(&[]), None);
//! ```
//!
//! ## Tab file names
//!
//! ```
//! use tabdump_sheet::Tab;
//!
//! let tab = Tab::from_data("Q1/Report", vec![vec!["x", "y"], vec!["z"]]);
//! assert_eq!(tab.file_name(), "Q1_Report.csv");
//! assert_eq!(tab.to_csv().unwrap(), "x,y\nz");
//! ```
//!
//! ## Ranges
//!
//! ```
//! use tabdump_sheet::A1Range;
//!
//! let range = A1Range::parse("A:Z").unwrap();
//! assert_eq!(range.for_tab("Q1 Report"), "'Q1 Report'!A:Z");
//! ```

mod cell;
mod csv;
mod range;
mod tab;

/// Re-export cell value type.
pub use cell::CellValue;
/// Re-export CSV serialization.
pub use csv::{serialize_field, serialize_grid, serialize_row, CsvOptions};
/// Re-export A1 range types.
pub use range::{column_index_to_letters, quote_tab_name, A1Range, CellBound};
/// Re-export tab types.
pub use tab::{csv_file_name, sanitize_file_stem, Tab};
