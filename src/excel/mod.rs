//! Excel import/export
//!
//! - Export: in-memory rows → .xlsx, with per-cell/per-sheet hooks and record templates
//! - Import: .xlsx/.xls/.ods → cell walks, typed records or header maps

pub mod cells;
pub mod convert;
pub mod dataset;
mod exporter;
pub mod header;
mod importer;

pub use convert::{parse_cell, FromCellText};
pub use dataset::{set_column_value, AddType};
pub use exporter::{
    export_record_template, insert_images, template_exporter, write_as_text, CellContext,
    CellFormat, CellValueFormat, ExcelExporter, SheetFormat,
};
pub use header::{set_value, ExcelHeader, ExcelRecord, HeaderSchema, ValueMap};
pub use importer::{cell_datetime, cell_text, CellVisit, ExcelImporter, RowMap, RowTraversal};
