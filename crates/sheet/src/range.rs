use std::fmt;
use tabdump_core::{ExportError, Result};

/// One end of an A1 range: a column with an optional 1-based row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBound {
    /// 0-based column index
    pub col: usize,
    /// 0-based row index; `None` for a whole-column bound like `A`
    pub row: Option<usize>,
}

impl fmt::Display for CellBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", column_index_to_letters(self.col))?;
        if let Some(row) = self.row {
            write!(f, "{}", row + 1)?;
        }
        Ok(())
    }
}

/// An A1-notation range without a sheet prefix, e.g. `A:Z` or `A1:D10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct A1Range {
    pub start: CellBound,
    pub end: Option<CellBound>,
}

impl A1Range {
    /// Parse a range such as `A:Z`, `A2:Z`, `B:B`, `A1:D10` or `C3`.
    ///
    /// Row-only ranges (`1:5`) and open-ended ranges (`A:`) are rejected.
    pub fn parse(notation: &str) -> Result<Self> {
        let notation = notation.trim();
        let invalid = || ExportError::invalid_range(notation);

        if notation.is_empty() {
            return Err(invalid());
        }

        let mut parts = notation.split(':');
        let start = parts.next().ok_or_else(invalid)?;
        let end = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }

        let start = parse_bound(start).ok_or_else(invalid)?;
        let end = match end {
            Some(end) => Some(parse_bound(end).ok_or_else(invalid)?),
            None => {
                // A lone column letter is not a range
                if start.row.is_none() {
                    return Err(invalid());
                }
                None
            }
        };

        Ok(A1Range { start, end })
    }

    /// The fully qualified range for a tab, e.g. `'Q1 Report'!A:Z`.
    #[must_use]
    pub fn for_tab(&self, tab_name: &str) -> String {
        format!("{}!{}", quote_tab_name(tab_name), self)
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)?;
        if let Some(end) = self.end {
            write!(f, ":{end}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for A1Range {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        A1Range::parse(s)
    }
}

/// Quote a tab name for use as an A1 sheet prefix.
///
/// The name is always wrapped in single quotes; embedded quotes are doubled.
#[must_use]
pub fn quote_tab_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Parse `A`, `AA`, `A1`, `ZZ99` (case insensitive) into a bound.
fn parse_bound(notation: &str) -> Option<CellBound> {
    let notation = notation.to_uppercase();
    let split_pos = notation
        .find(|c: char| !c.is_ascii_uppercase())
        .unwrap_or(notation.len());

    let col_part = &notation[..split_pos];
    let row_part = &notation[split_pos..];

    let col = parse_column_letters(col_part)?;
    if row_part.is_empty() {
        return Some(CellBound { col, row: None });
    }
    if !row_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    // Rows are 1-based in A1 notation
    let row = row_part.parse::<usize>().ok()?.checked_sub(1)?;
    Some(CellBound {
        col,
        row: Some(row),
    })
}

/// Convert column letters to 0-based column index
/// A=0, B=1, ... Z=25, AA=26, AB=27, ...
fn parse_column_letters(col_str: &str) -> Option<usize> {
    if col_str.is_empty() {
        return None;
    }

    let mut col: usize = 0;
    for b in col_str.bytes() {
        if !b.is_ascii_uppercase() {
            return None;
        }
        col = col.checked_mul(26)?.checked_add((b - b'A') as usize + 1)?;
    }

    Some(col - 1)
}

/// Convert 0-based column index to column letters
/// 0=A, 1=B, ... 25=Z, 26=AA, 27=AB, ...
#[must_use]
pub fn column_index_to_letters(mut col: usize) -> String {
    let mut result = String::new();
    col += 1;

    while col > 0 {
        col -= 1;
        result.insert(0, ((col % 26) as u8 + b'A') as char);
        col /= 26;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_range() {
        let range = A1Range::parse("A:Z").unwrap();
        assert_eq!(range.start, CellBound { col: 0, row: None });
        assert_eq!(range.end, Some(CellBound { col: 25, row: None }));
        assert_eq!(range.to_string(), "A:Z");
    }

    #[test]
    fn test_parse_cell_range() {
        let range = A1Range::parse("a1:d10").unwrap();
        assert_eq!(range.start, CellBound { col: 0, row: Some(0) });
        assert_eq!(range.end, Some(CellBound { col: 3, row: Some(9) }));
        assert_eq!(range.to_string(), "A1:D10");
    }

    #[test]
    fn test_parse_mixed_and_single() {
        assert_eq!(A1Range::parse("A2:Z").unwrap().to_string(), "A2:Z");
        assert_eq!(A1Range::parse("B:B").unwrap().to_string(), "B:B");
        assert_eq!(A1Range::parse("C3").unwrap().to_string(), "C3");
        assert_eq!(A1Range::parse("AA1:ZZ2").unwrap().to_string(), "AA1:ZZ2");
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "1:Z", "A:", ":Z", "A", "A0:B2", "A1:B2:C3", "A-1", "A1B"] {
            assert!(
                matches!(A1Range::parse(bad), Err(ExportError::InvalidRange(_))),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_from_str() {
        let range: A1Range = "A:C".parse().unwrap();
        assert_eq!(range.to_string(), "A:C");
    }

    #[test]
    fn test_quote_tab_name() {
        assert_eq!(quote_tab_name("Sheet1"), "'Sheet1'");
        assert_eq!(quote_tab_name("Q1 Report"), "'Q1 Report'");
        assert_eq!(quote_tab_name("Bob's"), "'Bob''s'");
    }

    #[test]
    fn test_for_tab() {
        let range = A1Range::parse("A:Z").unwrap();
        assert_eq!(range.for_tab("Q1/Report"), "'Q1/Report'!A:Z");
    }

    #[test]
    fn test_column_index_to_letters() {
        assert_eq!(column_index_to_letters(0), "A");
        assert_eq!(column_index_to_letters(25), "Z");
        assert_eq!(column_index_to_letters(26), "AA");
        assert_eq!(column_index_to_letters(52), "BA");
        assert_eq!(column_index_to_letters(701), "ZZ");
        assert_eq!(column_index_to_letters(702), "AAA");
    }

    #[test]
    fn test_letters_roundtrip() {
        for col in 0..800 {
            let letters = column_index_to_letters(col);
            assert_eq!(parse_column_letters(&letters), Some(col));
        }
    }
}
