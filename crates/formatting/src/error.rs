use thiserror::Error;

use crate::data_type::{CellCategory, DataType};

/// Errors raised while translating values and type names.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error(
        "Cell type does not match with given data type: cell is {category}, requested {requested}"
    )]
    TypeMismatch {
        category: CellCategory,
        requested: DataType,
    },

    #[error("Unknown data type: {0}")]
    UnknownType(String),

    #[error("Cannot read '{value}' as {expected}")]
    InvalidValue { value: String, expected: DataType },

    #[error("Invalid date pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid format configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, FormatError>;
