//! Cell text → typed field values

use crate::core::dates;
use crate::error::{OfficeError, OfficeResult};
use chrono::{NaiveDate, NaiveDateTime};

/// Conversion from the text of an imported cell
pub trait FromCellText: Sized {
    fn from_cell_text(text: &str) -> OfficeResult<Self>;
}

/// Convert cell text into any [`FromCellText`] type
pub fn parse_cell<T: FromCellText>(text: &str) -> OfficeResult<T> {
    T::from_cell_text(text)
}

fn conversion_error(text: &str, type_name: &str, cause: impl std::fmt::Display) -> OfficeError {
    OfficeError::Conversion(format!("'{}' can't convert to {}: {}", text, type_name, cause))
}

macro_rules! from_cell_text_via_parse {
    ($($t:ty),* $(,)?) => {
        $(
            impl FromCellText for $t {
                fn from_cell_text(text: &str) -> OfficeResult<Self> {
                    text.trim()
                        .parse::<$t>()
                        .map_err(|e| conversion_error(text, stringify!($t), e))
                }
            }
        )*
    };
}

from_cell_text_via_parse!(i8, u8, i16, u16, i32, u32, i64, u64, usize, f32, f64);

impl FromCellText for String {
    fn from_cell_text(text: &str) -> OfficeResult<Self> {
        Ok(text.to_string())
    }
}

impl FromCellText for char {
    fn from_cell_text(text: &str) -> OfficeResult<Self> {
        text.chars()
            .next()
            .ok_or_else(|| conversion_error(text, "char", "empty text"))
    }
}

/// Only a case-insensitive "true" is true
impl FromCellText for bool {
    fn from_cell_text(text: &str) -> OfficeResult<Self> {
        Ok(text.trim().eq_ignore_ascii_case("true"))
    }
}

impl FromCellText for NaiveDateTime {
    fn from_cell_text(text: &str) -> OfficeResult<Self> {
        dates::parse_try(text).ok_or_else(|| conversion_error(text, "NaiveDateTime", "unknown date format"))
    }
}

impl FromCellText for NaiveDate {
    fn from_cell_text(text: &str) -> OfficeResult<Self> {
        NaiveDateTime::from_cell_text(text).map(|dt| dt.date())
    }
}

/// Blank text is `None`
impl<T: FromCellText> FromCellText for Option<T> {
    fn from_cell_text(text: &str) -> OfficeResult<Self> {
        if text.trim().is_empty() {
            Ok(None)
        } else {
            T::from_cell_text(text).map(Some)
        }
    }
}
