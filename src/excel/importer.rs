//! Excel importer - .xlsx/.xls/.ods → cell walks, records and header maps

use crate::core::dates;
use crate::error::{OfficeError, OfficeResult};
use crate::excel::header::{self, ExcelRecord, HeaderSchema};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;

static EMPTY_CELL: Data = Data::Empty;

/// One imported row: header text → cell text, in column order
pub type RowMap = IndexMap<String, String>;

/// Text of a cell the way a spreadsheet displays it
pub fn cell_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(dt) => dates::format_all(&dt),
            None => format_float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(e) => e.to_string(),
    }
}

/// Spreadsheets show at most 15 significant digits
fn format_float(f: f64) -> String {
    let shown: f64 = format!("{:.14e}", f).parse().unwrap_or(f);
    if shown.fract() == 0.0 && shown.abs() < 1e15 {
        format!("{}", shown as i64)
    } else {
        shown.to_string()
    }
}

/// Date value of a cell: date cells, serial numbers and date-like text
pub fn cell_datetime(data: &Data) -> Option<NaiveDateTime> {
    match data {
        Data::DateTime(dt) => dt.as_datetime(),
        Data::Float(f) => dates::from_excel_serial(*f),
        Data::Int(i) => dates::from_excel_serial(*i as f64),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| dates::parse_try(s)),
        Data::String(s) => dates::parse_try(s),
        _ => None,
    }
}

/// A cell handed to an import walker
#[derive(Debug, Clone, Copy)]
pub struct CellVisit<'a> {
    pub sheet_index: usize,
    pub sheet_name: &'a str,
    pub row: u32,
    pub col: u32,
    /// Raw value; `Data::Empty` for missing cells
    pub data: &'a Data,
    /// Row 0 of the same column
    pub header: &'a Data,
}

impl CellVisit<'_> {
    pub fn text(&self) -> String {
        cell_text(self.data)
    }

    pub fn header_text(&self) -> String {
        cell_text(self.header)
    }

    pub fn datetime(&self) -> Option<NaiveDateTime> {
        cell_datetime(self.data)
    }
}

/// Collects walked cells into one map per visited row
#[derive(Debug, Default)]
pub struct RowTraversal {
    seen: HashSet<(usize, u32)>,
    rows: Vec<RowMap>,
}

impl RowTraversal {
    pub fn new() -> Self {
        Self::default()
    }

    /// The map of the visit's row, started on its first cell
    pub fn row_map(&mut self, visit: &CellVisit) -> &mut RowMap {
        if self.seen.insert((visit.sheet_index, visit.row)) {
            self.rows.push(RowMap::new());
        }
        let last = self.rows.len() - 1;
        &mut self.rows[last]
    }

    pub fn rows(&self) -> &[RowMap] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<RowMap> {
        self.rows
    }
}

struct LoadedSheet {
    name: String,
    range: Range<Data>,
}

impl LoadedSheet {
    fn cell(&self, row: u32, col: u32) -> &Data {
        self.range.get_value((row, col)).unwrap_or(&EMPTY_CELL)
    }
}

/// Excel importer walking the non-empty region of selected sheets
pub struct ExcelImporter {
    sheets: Vec<LoadedSheet>,
    walk_sheets: Vec<usize>,
    skip_rows: HashMap<usize, HashSet<u32>>,
    skip_columns: HashMap<usize, HashSet<u32>>,
}

impl ExcelImporter {
    /// Read a workbook (.xlsx, .xlsm, .xls or .ods) from memory
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> OfficeResult<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.into()))
            .map_err(|e| OfficeError::Import(format!("Failed to open workbook: {}", e)))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name).map_err(|e| {
                OfficeError::Import(format!("Failed to read sheet '{}': {}", name, e))
            })?;
            sheets.push(LoadedSheet { name, range });
        }

        Ok(Self {
            sheets,
            walk_sheets: vec![0],
            skip_rows: HashMap::new(),
            skip_columns: HashMap::new(),
        })
    }

    /// Read a workbook file
    pub fn open<P: AsRef<Path>>(path: P) -> OfficeResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            OfficeError::Import(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_bytes(bytes)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Sheets to walk, by index (default: the first sheet)
    pub fn walk_sheets(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.walk_sheets = indices.into_iter().collect();
        self
    }

    /// Replace the skipped rows of one sheet
    pub fn skip_rows(mut self, sheet: usize, rows: impl IntoIterator<Item = u32>) -> Self {
        self.skip_rows.insert(sheet, rows.into_iter().collect());
        self
    }

    /// Replace the skipped columns of one sheet
    pub fn skip_columns(mut self, sheet: usize, cols: impl IntoIterator<Item = u32>) -> Self {
        self.skip_columns.insert(sheet, cols.into_iter().collect());
        self
    }

    /// Visit every cell of the non-empty region, row by row
    pub fn walk_through<F>(&self, walker: F) -> OfficeResult<()>
    where
        F: FnMut(&CellVisit) -> OfficeResult<()>,
    {
        self.walk(false, walker)
    }

    fn walk<F>(&self, skip_header: bool, mut walker: F) -> OfficeResult<()>
    where
        F: FnMut(&CellVisit) -> OfficeResult<()>,
    {
        let no_skip = HashSet::new();

        for &sheet_index in &self.walk_sheets {
            let Some(sheet) = self.sheets.get(sheet_index) else {
                tracing::warn!(sheet_index, "walked sheet does not exist");
                continue;
            };
            let skip_rows = self.skip_rows.get(&sheet_index).unwrap_or(&no_skip);
            let skip_cols = self.skip_columns.get(&sheet_index).unwrap_or(&no_skip);
            let is_skipped_row = |row: u32| skip_rows.contains(&row) || (skip_header && row == 0);

            let Some((end_row, end_col)) = sheet.range.end() else {
                continue;
            };

            // row -> largest non-blank column
            let mut non_empty: BTreeMap<u32, u32> = BTreeMap::new();
            for row in 0..=end_row {
                if is_skipped_row(row) {
                    continue;
                }
                for col in (0..=end_col).filter(|c| !skip_cols.contains(c)) {
                    if !cell_text(sheet.cell(row, col)).is_empty() {
                        non_empty.insert(row, col);
                    }
                }
            }
            let max_col = non_empty.values().copied().max().unwrap_or(0);
            tracing::debug!(
                sheet = %sheet.name,
                rows = non_empty.len(),
                max_col,
                "walking sheet"
            );

            for &row in non_empty.keys() {
                for col in (0..=max_col).filter(|c| !skip_cols.contains(c)) {
                    let visit = CellVisit {
                        sheet_index,
                        sheet_name: &sheet.name,
                        row,
                        col,
                        data: sheet.cell(row, col),
                        header: sheet.cell(0, col),
                    };
                    walker(&visit)?;
                }
            }
        }
        Ok(())
    }

    /// One record per data row; row 0 of each walked sheet is the header row
    pub fn convert_to_list<T: ExcelRecord>(&self) -> OfficeResult<Vec<T>> {
        self.convert_to_list_with(|_: &mut T| {})
    }

    /// Like [`convert_to_list`](Self::convert_to_list), calling `callback` on each record once its row is filled
    pub fn convert_to_list_with<T, F>(&self, mut callback: F) -> OfficeResult<Vec<T>>
    where
        T: ExcelRecord,
        F: FnMut(&mut T),
    {
        let schema = HeaderSchema::of::<T>()?;
        let options = schema.header_options();
        let mut records: Vec<T> = Vec::new();
        let mut current: Option<(usize, u32)> = None;

        self.walk(true, |visit| {
            let key = (visit.sheet_index, visit.row);
            if current != Some(key) {
                if let Some(done) = records.last_mut() {
                    callback(done);
                }
                records.push(T::default());
                current = Some(key);
            }

            let value = visit.text();
            if value.is_empty() {
                return Ok(());
            }
            let header_name = visit.header_text();
            let value = match options.get(&header_name) {
                Some(map) => map
                    .get(&value)
                    .cloned()
                    .ok_or_else(|| OfficeError::UnmappedValue {
                        header: header_name.clone(),
                        value: value.clone(),
                    })?,
                None => value,
            };
            let record = records
                .last_mut()
                .ok_or_else(|| OfficeError::Import("No record for visited row".to_string()))?;
            header::set_value(record, &header_name, &value)
        })?;

        if let Some(last) = records.last_mut() {
            callback(last);
        }
        tracing::info!(
            record = std::any::type_name::<T>(),
            rows = records.len(),
            "excel import complete"
        );
        Ok(records)
    }

    /// One header → text map per data row; row 0 of each walked sheet is the header row
    pub fn convert_to_map(&self) -> OfficeResult<Vec<RowMap>> {
        self.convert_to_map_with(|_| {})
    }

    pub fn convert_to_map_with<F>(&self, mut callback: F) -> OfficeResult<Vec<RowMap>>
    where
        F: FnMut(&mut RowMap),
    {
        let mut traversal = RowTraversal::new();
        self.walk(true, |visit| {
            traversal
                .row_map(visit)
                .insert(visit.header_text(), visit.text());
            Ok(())
        })?;

        let mut rows = traversal.into_rows();
        rows.iter_mut().for_each(&mut callback);
        tracing::info!(rows = rows.len(), "excel import complete");
        Ok(rows)
    }
}
