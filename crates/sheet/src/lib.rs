//! Workbook access for xlrobot
//!
//! Reads `.xls` and `.xlsx` files through `calamine` and writes them back
//! through `rust_xlsxwriter` (`.xlsx`) or a BIFF8 compound-file writer
//! (`.xls`). A file is decoded into an in-memory [`Workbook`] once; a writer
//! edits a private copy of it and produces a fresh file on save.
//!
//! # Examples
//!
//! ## Writing and reading back
//!
//! ```
//! use std::sync::Arc;
//! use xlrobot_formatting::{DataType, Formats};
//! use xlrobot_sheet::{CellValue, ExcelReader, ExcelWriter};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("report.xlsx");
//! let formats = Arc::new(Formats::default());
//!
//! let mut writer = ExcelWriter::open(&path, None, false, Arc::clone(&formats)).unwrap();
//! writer.create_sheet("Sheet1").unwrap();
//! writer.write_cell("Sheet1", 0, 0, 25.5, Some(DataType::Number)).unwrap();
//! writer.save_excel().unwrap();
//!
//! let reader = ExcelReader::open(&path, formats).unwrap();
//! assert_eq!(reader.sheet_names(), vec!["Sheet", "Sheet1"]);
//! assert_eq!(
//!     reader.read_cell_by_name("Sheet1", "A1", Some(DataType::Number), true).unwrap(),
//!     CellValue::Text("25.50".to_string())
//! );
//! ```
//!
//! ## Listing values
//!
//! ```no_run
//! use std::sync::Arc;
//! use xlrobot_formatting::Formats;
//! use xlrobot_sheet::ExcelReader;
//!
//! let reader = ExcelReader::open("data.xls", Arc::new(Formats::default())).unwrap();
//! for (name, value) in reader.sheet_values("Sheet1", false).unwrap() {
//!     println!("{name}: {value}");
//! }
//! ```

mod cell;
mod error;
mod numfmt;
mod path;
mod reader;
mod workbook;
mod writer;
mod xls;
mod xlsx;

/// Re-export cell value types.
pub use cell::{CellValue, WriteValue};
/// Re-export error types.
pub use error::{ExcelError, Result};
/// Re-export file format detection.
pub use path::{resolve_path, FileFormat};
/// Re-export the read-only view.
pub use reader::{CellPairs, ExcelReader};
/// Re-export the in-memory workbook model.
pub use workbook::{validate_sheet_name, Cell, Sheet, Workbook, DEFAULT_SHEET_NAME};
/// Re-export the copy-on-write editor.
pub use writer::{ExcelWriter, WriterState};
