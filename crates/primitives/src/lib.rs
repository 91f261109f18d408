//! # xlrobot primitives
//!
//! Cell coordinates and the translation between them and spreadsheet-style
//! `A1` names.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod address;

pub use address::{
    column_index_to_letters, column_letters_to_index, coord_to_excel_name, excel_name_to_coord,
    natural_cmp,
};

/// A zero-based cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub col: u32,
    pub row: u32,
}

impl CellCoord {
    /// Create a new coordinate
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Parse from A1 notation (e.g., "A1", "b12")
    pub fn from_name(name: &str) -> Result<Self, AddressError> {
        let (col, row) = excel_name_to_coord(name)?;
        Ok(Self { col, row })
    }

    /// Convert to A1 notation
    pub fn to_name(&self) -> String {
        coord_to_excel_name(self.col, self.row)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_name())
    }
}

/// Errors raised while translating cell names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Cell name is invalid: '{0}'")]
    InvalidName(String),
    #[error("Invalid column: {0}")]
    InvalidColumn(String),
    #[error("Invalid row: {0}")]
    InvalidRow(String),
}
