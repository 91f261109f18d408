use std::path::PathBuf;

use thiserror::Error;
use xlrobot_formatting::FormatError;
use xlrobot_primitives::AddressError;

use crate::path::FileFormat;

/// Errors that can occur while reading or writing workbooks
#[derive(Error, Debug)]
pub enum ExcelError {
    #[error("Only support file with extension: xls and xlsx, got '{}'", path.display())]
    InvalidExtension { path: PathBuf },

    #[error("Excel file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Destination file already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Sheet not found: {name} (available: {})", available.join(", "))]
    SheetNotFound { name: String, available: Vec<String> },

    #[error("Sheet already exists: {name}")]
    SheetExists { name: String },

    #[error("Cell {cell} is out of range for {format} files")]
    CellOutOfRange { cell: String, format: FileFormat },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Workbook was already saved; open a new writer to make further changes")]
    SessionClosed,

    #[error("Failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("Failed to write workbook: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExcelError>;
