use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// A single cell value as returned by the spreadsheet API
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl CellValue {
    /// Check if the value is null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Get the display string for the value.
    ///
    /// Null renders as the empty string and booleans use the spreadsheet
    /// spelling (`TRUE` / `FALSE`).
    #[must_use]
    pub fn as_str(&self) -> String {
        self.to_string()
    }

    /// Convert a JSON value from an API response into a cell value.
    #[must_use]
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => CellValue::Null,
            JsonValue::Bool(b) => CellValue::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Int(i)
                } else {
                    n.as_f64().map_or_else(|| CellValue::String(n.to_string()), CellValue::Float)
                }
            }
            JsonValue::String(s) => CellValue::String(s),
            other @ (JsonValue::Array(_) | JsonValue::Object(_)) => {
                CellValue::String(other.to_string())
            }
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(fl) => write!(f, "{fl}"),
            CellValue::String(s) => f.write_str(s),
        }
    }
}

impl From<JsonValue> for CellValue {
    fn from(value: JsonValue) -> Self {
        CellValue::from_json(value)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Bool(true).to_string(), "TRUE");
        assert_eq!(CellValue::Bool(false).to_string(), "FALSE");
        assert_eq!(CellValue::Int(-42).to_string(), "-42");
        assert_eq!(CellValue::Float(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Float(2.0).to_string(), "2");
        assert_eq!(CellValue::from("a,b").to_string(), "a,b");
    }

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(CellValue::from_json(json!(null)), CellValue::Null);
        assert_eq!(CellValue::from_json(json!(true)), CellValue::Bool(true));
        assert_eq!(CellValue::from_json(json!(7)), CellValue::Int(7));
        assert_eq!(CellValue::from_json(json!(1.25)), CellValue::Float(1.25));
        assert_eq!(
            CellValue::from_json(json!("hello")),
            CellValue::String("hello".to_string())
        );
    }

    #[test]
    fn test_from_json_nested_falls_back_to_text() {
        assert_eq!(
            CellValue::from_json(json!([1, 2])),
            CellValue::String("[1,2]".to_string())
        );
    }

    #[test]
    fn test_from_option() {
        assert_eq!(CellValue::from(None::<&str>), CellValue::Null);
        assert_eq!(CellValue::from(Some(3)), CellValue::Int(3));
        assert!(CellValue::from(None::<i64>).is_null());
    }

    #[test]
    fn test_deserialize_untagged() {
        let row: Vec<CellValue> = serde_json::from_str(r#"["x", 1, 1.5, false, null]"#).unwrap();
        assert_eq!(
            row,
            vec![
                CellValue::from("x"),
                CellValue::Int(1),
                CellValue::Float(1.5),
                CellValue::Bool(false),
                CellValue::Null,
            ]
        );
    }
}
