//! Keyword errors.

use std::path::PathBuf;

use thiserror::Error;
use xlrobot_formatting::FormatError;
use xlrobot_sheet::ExcelError;

/// Result type for keyword calls.
pub type Result<T> = std::result::Result<T, KeywordError>;

/// Errors raised by keyword calls.
#[derive(Debug, Error)]
pub enum KeywordError {
    /// A keyword ran before any workbook was opened.
    #[error("No workbook is open; call open_excel or open_excel_to_write first")]
    NoActiveSession,

    /// A write keyword ran on a workbook opened for reading.
    #[error("Workbook {} is open read-only; reopen it with open_excel_to_write", path.display())]
    ReadOnlySession { path: PathBuf },

    #[error(transparent)]
    Excel(#[from] ExcelError),

    #[error(transparent)]
    Format(#[from] FormatError),
}
