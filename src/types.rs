use chrono::NaiveDateTime;
use std::fmt;

//==============================================================================
// Cell Values
//==============================================================================

/// A single spreadsheet cell as handed to the exporter
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Nothing is written
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Integer(i64),
    Bool(bool),
    /// Written as a date-formatted serial number
    DateTime(NaiveDateTime),
    /// Raw image bytes (PNG, JPEG, GIF or BMP), inserted fitted to the cell
    Image(Vec<u8>),
}

/// One row of cells
pub type RowData = Vec<CellValue>;

/// One worksheet worth of rows
pub type SheetData = Vec<RowData>;

impl CellValue {
    /// Build an image cell from raw bytes
    pub fn image(bytes: impl Into<Vec<u8>>) -> Self {
        CellValue::Image(bytes.into())
    }

    /// True for `Empty` and for text that is blank after trimming
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Image(bytes) => bytes.is_empty(),
            _ => false,
        }
    }

    /// Text rendering of the value, `None` for empty cells and images
    pub fn to_text(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        match self {
            CellValue::Image(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "Empty",
            CellValue::Text(_) => "Text",
            CellValue::Number(_) => "Number",
            CellValue::Integer(_) => "Integer",
            CellValue::Bool(_) => "Bool",
            CellValue::DateTime(_) => "DateTime",
            CellValue::Image(_) => "Image",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) => write!(f, "{}", crate::core::dates::format_all(dt)),
            CellValue::Image(bytes) => write!(f, "<image {} bytes>", bytes.len()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<&String> for CellValue {
    fn from(s: &String) -> Self {
        CellValue::Text(s.clone())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Integer(i as i64)
    }
}

impl From<u32> for CellValue {
    fn from(i: u32) -> Self {
        CellValue::Integer(i as i64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

impl From<&serde_yaml::Value> for CellValue {
    fn from(value: &serde_yaml::Value) -> Self {
        use serde_yaml::Value;
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Integer(i)
                } else {
                    CellValue::Number(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Tagged(tagged) => CellValue::from(&tagged.value),
            // Nested structures have no cell representation; keep their YAML text
            other => serde_yaml::to_string(other)
                .map(|s| CellValue::Text(s.trim_end().to_string()))
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_display_drops_integral_fraction() {
        assert_eq!(CellValue::Number(90.0).to_string(), "90");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Integer(-3).to_string(), "-3");
    }

    #[test]
    fn test_to_text_skips_empty_and_images() {
        assert_eq!(CellValue::Empty.to_text(), None);
        assert_eq!(CellValue::from("   ").to_text(), None);
        assert_eq!(CellValue::image(vec![1u8, 2, 3]).to_text(), None);
        assert_eq!(CellValue::from("a").to_text(), Some("a".to_string()));
    }

    #[test]
    fn test_datetime_display() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(8, 5, 0)
            .unwrap();
        assert_eq!(CellValue::from(dt).to_string(), "2024-03-09 08:05:00");
    }

    #[test]
    fn test_from_yaml_value() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("[1, 2.5, hi, true, null]").unwrap();
        let cells: Vec<CellValue> = yaml
            .as_sequence()
            .unwrap()
            .iter()
            .map(CellValue::from)
            .collect();
        assert_eq!(
            cells,
            vec![
                CellValue::Integer(1),
                CellValue::Number(2.5),
                CellValue::Text("hi".to_string()),
                CellValue::Bool(true),
                CellValue::Empty,
            ]
        );
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(CellValue::from(None::<i32>), CellValue::Empty);
        assert_eq!(CellValue::from(Some(4)), CellValue::Integer(4));
    }
}
