//! Excel exporter - in-memory data sets → .xlsx

use crate::core::dates;
use crate::error::{OfficeError, OfficeResult};
use crate::excel::cells;
use crate::excel::header::{ExcelRecord, HeaderSchema};
use crate::types::{CellValue, SheetData};
use rust_xlsxwriter::{Format, Image, Workbook, Worksheet};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use unicode_width::UnicodeWidthStr;

/// Excel caps column widths at 255 characters
const MAX_COLUMN_WIDTH: f64 = 255.0;

/// Extra room added to the widest text of an auto-sized column
const COLUMN_WIDTH_PADDING: f64 = 2.0;

/// Template dropdowns cover rows 1..=500
const TEMPLATE_DROPDOWN_LAST_ROW: u32 = 500;

const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Position of the cell handed to the per-cell hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellContext {
    pub sheet_index: usize,
    pub row: u32,
    pub col: u16,
}

/// Decides what is written for a cell; `None` writes nothing
pub type CellValueFormat =
    Box<dyn Fn(&CellContext, &mut Worksheet, &CellValue) -> OfficeResult<Option<CellValue>>>;

/// Styles a cell after all values of the sheet are written
pub type CellFormat = Box<dyn Fn(&CellContext, &mut Worksheet, &CellValue) -> OfficeResult<()>>;

/// Runs once per sheet with its sheet index, max row and max column
pub type SheetFormat = Box<dyn Fn(usize, &mut Worksheet, u32, u16) -> OfficeResult<()>>;

/// Default value format: images are inserted fitted to their cell, everything else is written typed
pub fn insert_images() -> CellValueFormat {
    Box::new(|ctx: &CellContext, worksheet: &mut Worksheet, value: &CellValue| match value {
        CellValue::Image(bytes) if !bytes.is_empty() => {
            insert_image(worksheet, ctx.row, ctx.col, bytes)?;
            Ok(None)
        }
        v if v.is_empty() => Ok(None),
        v => Ok(Some(v.clone())),
    })
}

/// Value format that writes every non-empty value as its text
pub fn write_as_text() -> CellValueFormat {
    Box::new(|_: &CellContext, _: &mut Worksheet, value: &CellValue| {
        Ok(value.to_text().map(CellValue::Text))
    })
}

fn insert_image(worksheet: &mut Worksheet, row: u32, col: u16, bytes: &[u8]) -> OfficeResult<()> {
    let image = Image::new_from_buffer(bytes)
        .map_err(|e| OfficeError::Export(format!("Failed to read image: {}", e)))?;
    worksheet
        .insert_image_fit_to_cell(row, col, &image, false)
        .map_err(|e| OfficeError::Export(format!("Failed to insert image: {}", e)))?;
    Ok(())
}

/// Excel exporter for one or more sheets of rows
pub struct ExcelExporter {
    data_set: Vec<SheetData>,
    sheet_names: Vec<String>,
    auto_resize_column_width: bool,
    cell_value_format: CellValueFormat,
    cell_format: Option<CellFormat>,
    sheet_format: Option<SheetFormat>,
    /// sheet index -> hidden column indices
    hidden_columns: HashMap<usize, BTreeSet<u16>>,
}

impl Default for ExcelExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExcelExporter {
    /// Create a new Excel exporter
    pub fn new() -> Self {
        Self {
            data_set: Vec::new(),
            sheet_names: Vec::new(),
            auto_resize_column_width: true,
            cell_value_format: insert_images(),
            cell_format: None,
            sheet_format: None,
            hidden_columns: HashMap::new(),
        }
    }

    /// One entry per sheet
    pub fn data_set(mut self, data_set: Vec<SheetData>) -> Self {
        self.data_set = data_set;
        self
    }

    pub fn single_sheet_data_set(mut self, sheet: SheetData) -> Self {
        self.data_set = vec![sheet];
        self
    }

    /// Names for the first sheets; the rest are named `SheetN`
    pub fn sheet_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sheet_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn auto_resize_column_width(mut self, auto_resize: bool) -> Self {
        self.auto_resize_column_width = auto_resize;
        self
    }

    pub fn cell_value_format<F>(mut self, format: F) -> Self
    where
        F: Fn(&CellContext, &mut Worksheet, &CellValue) -> OfficeResult<Option<CellValue>> + 'static,
    {
        self.cell_value_format = Box::new(format);
        self
    }

    /// Not called for hidden columns
    pub fn cell_format<F>(mut self, format: F) -> Self
    where
        F: Fn(&CellContext, &mut Worksheet, &CellValue) -> OfficeResult<()> + 'static,
    {
        self.cell_format = Some(Box::new(format));
        self
    }

    pub fn sheet_format<F>(mut self, format: F) -> Self
    where
        F: Fn(usize, &mut Worksheet, u32, u16) -> OfficeResult<()> + 'static,
    {
        self.sheet_format = Some(Box::new(format));
        self
    }

    pub fn hidden_columns(mut self, sheet_index: usize, columns: impl IntoIterator<Item = u16>) -> Self {
        self.hidden_columns
            .entry(sheet_index)
            .or_default()
            .extend(columns);
        self
    }

    /// Export to .xlsx bytes
    pub fn export(&self) -> OfficeResult<Vec<u8>> {
        let mut workbook = self.build_workbook()?;
        let bytes = workbook
            .save_to_buffer()
            .map_err(|e| OfficeError::Export(format!("Failed to serialize workbook: {}", e)))?;
        tracing::info!(sheets = self.data_set.len(), bytes = bytes.len(), "excel export complete");
        Ok(bytes)
    }

    /// Export to an .xlsx file
    pub fn export_to(&self, output_path: &Path) -> OfficeResult<()> {
        let mut workbook = self.build_workbook()?;
        workbook
            .save(output_path)
            .map_err(|e| OfficeError::Export(format!("Failed to save Excel file: {}", e)))?;
        tracing::info!(path = %output_path.display(), "excel export complete");
        Ok(())
    }

    fn build_workbook(&self) -> OfficeResult<Workbook> {
        let mut workbook = Workbook::new();
        for (sheet_index, sheet) in self.data_set.iter().enumerate() {
            let worksheet = self.export_sheet(sheet_index, sheet)?;
            workbook.push_worksheet(worksheet);
        }
        Ok(workbook)
    }

    fn export_sheet(&self, sheet_index: usize, sheet: &SheetData) -> OfficeResult<Worksheet> {
        let mut worksheet = Worksheet::new();
        let name = self
            .sheet_names
            .get(sheet_index)
            .cloned()
            .unwrap_or_else(|| format!("Sheet{}", sheet_index + 1));
        worksheet
            .set_name(&name)
            .map_err(|e| OfficeError::Export(format!("Failed to set worksheet name '{}': {}", name, e)))?;
        tracing::debug!(sheet = %name, rows = sheet.len(), "exporting sheet");

        let hidden = self.hidden_columns.get(&sheet_index);
        let date_format = Format::new().set_num_format(DATETIME_NUM_FORMAT);
        let mut widths: Vec<usize> = Vec::new();
        let mut max_col: u16 = 0;

        for (row_idx, row) in sheet.iter().enumerate() {
            let row_num = to_row(row_idx)?;
            for (col_idx, value) in row.iter().enumerate() {
                let col_num = to_col(col_idx)?;
                max_col = max_col.max(col_num);
                let ctx = CellContext {
                    sheet_index,
                    row: row_num,
                    col: col_num,
                };
                let Some(written) = (self.cell_value_format)(&ctx, &mut worksheet, value)? else {
                    continue;
                };
                write_cell_value(&mut worksheet, row_num, col_num, &written, &date_format)?;

                if let Some(text) = written.to_text() {
                    if widths.len() <= col_idx {
                        widths.resize(col_idx + 1, 0);
                    }
                    widths[col_idx] = widths[col_idx].max(text.width());
                }
            }
        }

        if let Some(cell_format) = &self.cell_format {
            for (row_idx, row) in sheet.iter().enumerate() {
                for (col_idx, value) in row.iter().enumerate() {
                    let col_num = to_col(col_idx)?;
                    if hidden.is_some_and(|cols| cols.contains(&col_num)) {
                        continue;
                    }
                    let ctx = CellContext {
                        sheet_index,
                        row: to_row(row_idx)?,
                        col: col_num,
                    };
                    cell_format(&ctx, &mut worksheet, value)?;
                }
            }
        }

        for &col in hidden.into_iter().flatten() {
            worksheet
                .set_column_hidden(col)
                .map_err(|e| OfficeError::Export(format!("Failed to hide column: {}", e)))?;
        }

        if self.auto_resize_column_width {
            for (col_idx, &width) in widths.iter().enumerate() {
                if width == 0 {
                    continue;
                }
                let width = (width as f64 + COLUMN_WIDTH_PADDING).min(MAX_COLUMN_WIDTH);
                worksheet
                    .set_column_width(to_col(col_idx)?, width)
                    .map_err(|e| OfficeError::Export(format!("Failed to set column width: {}", e)))?;
            }
        }

        if let Some(sheet_format) = &self.sheet_format {
            let max_row = to_row(sheet.len().saturating_sub(1))?;
            sheet_format(sheet_index, &mut worksheet, max_row, max_col)?;
        }

        Ok(worksheet)
    }
}

/// Write a single typed cell value
fn write_cell_value(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    date_format: &Format,
) -> OfficeResult<()> {
    match value {
        CellValue::Empty => {}
        CellValue::Text(text) => {
            worksheet
                .write_string(row, col, text)
                .map_err(|e| OfficeError::Export(format!("Failed to write text: {}", e)))?;
        }
        CellValue::Number(n) => {
            worksheet
                .write_number(row, col, *n)
                .map_err(|e| OfficeError::Export(format!("Failed to write number: {}", e)))?;
        }
        CellValue::Integer(i) => {
            worksheet
                .write_number(row, col, *i as f64)
                .map_err(|e| OfficeError::Export(format!("Failed to write number: {}", e)))?;
        }
        CellValue::Bool(b) => {
            worksheet
                .write_boolean(row, col, *b)
                .map_err(|e| OfficeError::Export(format!("Failed to write boolean: {}", e)))?;
        }
        CellValue::DateTime(dt) => {
            worksheet
                .write_number_with_format(row, col, dates::to_excel_serial(dt), date_format)
                .map_err(|e| OfficeError::Export(format!("Failed to write date: {}", e)))?;
        }
        CellValue::Image(bytes) => insert_image(worksheet, row, col, bytes)?,
    }
    Ok(())
}

fn to_row(index: usize) -> OfficeResult<u32> {
    u32::try_from(index).map_err(|_| OfficeError::Export(format!("Row index {} out of range", index)))
}

fn to_col(index: usize) -> OfficeResult<u16> {
    u16::try_from(index)
        .map_err(|_| OfficeError::Export(format!("Column index {} out of range", index)))
}

//==============================================================================
// Record templates
//==============================================================================

/// Header row, default values, dropdowns and hidden columns declared by `T`
pub fn export_record_template<T: ExcelRecord>() -> OfficeResult<Vec<u8>> {
    template_exporter::<T>()?.export()
}

/// The exporter behind [`export_record_template`], for callers that want to tweak it
pub fn template_exporter<T: ExcelRecord>() -> OfficeResult<ExcelExporter> {
    let schema = HeaderSchema::of::<T>()?;

    let mut content: SheetData = vec![Vec::new()];
    let mut hidden = Vec::new();
    for (col_idx, header) in schema.headers().iter().enumerate() {
        content[0].push(CellValue::from(&header.name));
        if header.hidden {
            hidden.push(to_col(col_idx)?);
        }

        for (i, value) in header.resolved_default_values().into_iter().enumerate() {
            let row_idx = i + 1;
            if content.len() <= row_idx {
                content.resize_with(row_idx + 1, Vec::new);
            }
            let row = &mut content[row_idx];
            if row.len() < col_idx {
                row.resize(col_idx, CellValue::Empty);
            }
            row.push(CellValue::Text(value));
        }
    }

    let exporter = ExcelExporter::new()
        .single_sheet_data_set(content)
        .hidden_columns(0, hidden)
        .sheet_format(move |_, worksheet, _, _| {
            for (col_idx, header) in schema.headers().iter().enumerate() {
                if let Some(options) = header.resolved_value_map() {
                    let keys: Vec<&str> = options.keys().map(String::as_str).collect();
                    let col = to_col(col_idx)?;
                    cells::set_optional_list(worksheet, &keys, 1, TEMPLATE_DROPDOWN_LAST_ROW, col, col)?;
                }
            }
            Ok(())
        });
    Ok(exporter)
}
