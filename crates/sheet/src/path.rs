use std::fmt;
use std::path::{Path, PathBuf};

use xlrobot_primitives::coord_to_excel_name;

use crate::error::{ExcelError, Result};

/// Physical file format, selected by extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Legacy BIFF8 workbook inside an OLE compound file
    Xls,
    /// Zip-packaged XML workbook
    Xlsx,
}

impl FileFormat {
    /// Detect the format from the path's extension (ASCII case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("xls") => Ok(FileFormat::Xls),
            Some("xlsx") => Ok(FileFormat::Xlsx),
            _ => Err(ExcelError::InvalidExtension {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Xls => "xls",
            FileFormat::Xlsx => "xlsx",
        }
    }

    pub fn max_rows(self) -> u32 {
        match self {
            FileFormat::Xls => 65_536,
            FileFormat::Xlsx => 1_048_576,
        }
    }

    pub fn max_cols(self) -> u32 {
        match self {
            FileFormat::Xls => 256,
            FileFormat::Xlsx => 16_384,
        }
    }

    /// Fails when `(col, row)` lies outside this format's grid.
    pub fn check_cell(self, col: u32, row: u32) -> Result<()> {
        if col < self.max_cols() && row < self.max_rows() {
            Ok(())
        } else {
            Err(ExcelError::CellOutOfRange {
                cell: coord_to_excel_name(col, row),
                format: self,
            })
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Validate the extension and anchor relative paths at the current directory.
pub fn resolve_path(path: &Path) -> Result<(PathBuf, FileFormat)> {
    let format = FileFormat::from_path(path)?;
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok((resolved, format))
}
