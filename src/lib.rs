//! officekit - Office document helpers
//!
//! This library reads and writes spreadsheets, fills Word templates and
//! bundles the small date, text and collection utilities they rely on.
//!
//! # Features
//!
//! - Excel export from in-memory rows, with per-cell and per-sheet hooks
//! - Excel import into typed records declared through [`excel::ExcelRecord`]
//! - Record templates with header order, dropdowns and default values
//! - `${name}` replacement in .docx files (text, images, tables)
//! - Tolerant date parsing, ranges and calendar arithmetic
//!
//! # Example
//!
//! ```no_run
//! use officekit::docx::{DocxDocument, Replacement, Replacements};
//! use std::path::Path;
//!
//! let mut doc = DocxDocument::open(Path::new("letter.docx"))?;
//! let mut values = Replacements::new();
//! values.insert("name".to_string(), Replacement::from("Ann"));
//! doc.replace_content(&values)?;
//! doc.save(Path::new("out.docx"))?;
//! # Ok::<(), officekit::error::OfficeError>(())
//! ```

pub mod cli;
pub mod core;
pub mod docx;
pub mod error;
pub mod excel;
pub mod files;
pub mod types;

// Re-export commonly used types
pub use error::{OfficeError, OfficeResult};
pub use types::{CellValue, RowData, SheetData};
