//! # xlrobot-keywords
//!
//! Spreadsheet keywords for test automation. An [`ExcelLibrary`] holds one
//! active session, either a read-only [`ExcelReader`] or a copy-on-write
//! [`ExcelWriter`], and forwards every keyword to it.
//!
//! ```
//! use xlrobot_keywords::{CellValue, ExcelLibrary, FormatConfig};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("release.xls");
//!
//! let mut library = ExcelLibrary::new(&FormatConfig::default()).unwrap();
//! library.open_excel_to_write(&path, None, false).unwrap();
//! library.write_to_cell_by_name("Sheet", "A1", "Release", Some("TEXT")).unwrap();
//! library.write_to_cell_by_name("Sheet", "B1", "2024-03-15", Some("DATE")).unwrap();
//! library.save_excel().unwrap();
//!
//! library.open_excel(&path).unwrap();
//! assert_eq!(
//!     library.read_cell_data_by_name("Sheet", "B1", Some("date"), true).unwrap(),
//!     CellValue::Text("2024-03-15".to_string())
//! );
//! ```

mod error;
mod library;
mod session;

pub use error::{KeywordError, Result};
pub use library::ExcelLibrary;
pub use session::Session;

pub use xlrobot_formatting::{DataType, FormatConfig, Formats};
pub use xlrobot_sheet::{CellPairs, CellValue, ExcelReader, ExcelWriter, WriteValue};
