//! Cell-level helpers: A1 references, dropdown lists, prompts and error tips

use crate::error::{OfficeError, OfficeResult};
use crate::types::CellValue;
use rust_xlsxwriter::{Color, DataValidation, Format, FormatPattern, Formula, Worksheet};

/// Title of every prompt box added by [`set_prompt`]
pub const PROMPT_TITLE: &str = "------------tips-------------";

/// Prompt messages are cut to this many chars
pub const PROMPT_MAX_CHARS: usize = 254;

fn validation_err(e: impl std::fmt::Display) -> OfficeError {
    OfficeError::Export(format!("Failed to add data validation: {}", e))
}

/// Convert a 0-based column index to letters (0 → A, 26 → AA)
pub fn number_to_column_letter(n: usize) -> String {
    let mut result = String::new();
    let mut num = n;

    loop {
        let remainder = num % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if num < 26 {
            break;
        }
        num = num / 26 - 1;
    }

    result
}

/// `A1` style reference of a 0-based position
pub fn cell_position(row: u32, col: u16) -> String {
    format!("{}{}", number_to_column_letter(col as usize), row as u64 + 1)
}

/// Dropdown of explicit options over a cell range
pub fn set_optional_list<S: AsRef<str>>(
    worksheet: &mut Worksheet,
    options: &[S],
    first_row: u32,
    last_row: u32,
    first_col: u16,
    last_col: u16,
) -> OfficeResult<()> {
    let validation = DataValidation::new()
        .allow_list_strings(options)
        .map_err(validation_err)?;
    worksheet
        .add_data_validation(first_row, first_col, last_row, last_col, &validation)
        .map_err(validation_err)?;
    Ok(())
}

/// Dropdown whose options come from a column range of another sheet
#[allow(clippy::too_many_arguments)]
pub fn set_optional_list_from_range(
    worksheet: &mut Worksheet,
    first_row: u32,
    last_row: u32,
    first_col: u16,
    last_col: u16,
    source_sheet: &str,
    source_first_row: u32,
    source_last_row: u32,
    source_col: u16,
) -> OfficeResult<()> {
    let col = number_to_column_letter(source_col as usize);
    let reference = format!(
        "='{}'!${}${}:${}${}",
        source_sheet.replace('\'', "''"),
        col,
        source_first_row as u64 + 1,
        col,
        source_last_row as u64 + 1
    );
    let validation = DataValidation::new().allow_list_formula(Formula::new(reference));
    worksheet
        .add_data_validation(first_row, first_col, last_row, last_col, &validation)
        .map_err(validation_err)?;
    Ok(())
}

/// Attach a hover prompt to one cell
pub fn set_prompt(worksheet: &mut Worksheet, row: u32, col: u16, prompt: &str) -> OfficeResult<()> {
    let message: String = prompt.chars().take(PROMPT_MAX_CHARS).collect();
    let validation = DataValidation::new()
        .allow_custom(Formula::new("A1"))
        .set_input_title(PROMPT_TITLE)
        .map_err(validation_err)?
        .set_input_message(&message)
        .map_err(validation_err)?;
    worksheet
        .add_data_validation(row, col, row, col, &validation)
        .map_err(validation_err)?;
    Ok(())
}

/// Highlight a cell with a solid fill and explain why in a prompt.
///
/// Nothing happens when `value` is empty.
pub fn set_error_tips(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    tip: &str,
    color: Color,
) -> OfficeResult<()> {
    if value.is_empty() {
        return Ok(());
    }
    let format = Format::new()
        .set_background_color(color)
        .set_pattern(FormatPattern::Solid);
    worksheet
        .set_cell_format(row, col, &format)
        .map_err(|e| OfficeError::Export(format!("Failed to format {}: {}", cell_position(row, col), e)))?;
    set_prompt(worksheet, row, col, tip)
}

/// [`set_error_tips`] in red
pub fn set_error_tips_red(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    tip: &str,
) -> OfficeResult<()> {
    set_error_tips(worksheet, row, col, value, tip, Color::Red)
}
