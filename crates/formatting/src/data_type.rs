use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FormatError, Result};

/// The physical kind of value a spreadsheet cell stores.
///
/// Both file formats only distinguish these few kinds; everything finer
/// (currency vs. percentage, date vs. time) lives in the display format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellCategory {
    Empty,
    Text,
    Number,
    Date,
    Bool,
    Error,
}

impl CellCategory {
    /// Fails unless a cell of this category can be read as `requested`.
    ///
    /// Date, number and bool cells accept their own family or `TEXT`; text
    /// cells accept only `TEXT`. Empty and error cells carry no typed value, so
    /// every request is accepted and the cell value is returned as is.
    pub fn check_requested(self, requested: Option<DataType>) -> Result<()> {
        let Some(requested) = requested else {
            return Ok(());
        };
        let compatible = match self {
            CellCategory::Date => requested.is_date() || requested == DataType::Text,
            CellCategory::Number => requested.is_number() || requested == DataType::Text,
            CellCategory::Bool => requested.is_bool() || requested == DataType::Text,
            CellCategory::Text => requested == DataType::Text,
            CellCategory::Empty | CellCategory::Error => true,
        };
        if compatible {
            Ok(())
        } else {
            Err(FormatError::TypeMismatch {
                category: self,
                requested,
            })
        }
    }
}

impl fmt::Display for CellCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellCategory::Empty => "empty",
            CellCategory::Text => "text",
            CellCategory::Number => "number",
            CellCategory::Date => "date",
            CellCategory::Bool => "boolean",
            CellCategory::Error => "error",
        };
        f.write_str(name)
    }
}

/// Semantic cell types callers can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Date,
    Time,
    DateTime,
    Text,
    Number,
    Currency,
    Percentage,
    Blank,
    Empty,
    Error,
    Bool,
}

impl DataType {
    pub const ALL: [DataType; 11] = [
        DataType::Date,
        DataType::Time,
        DataType::DateTime,
        DataType::Text,
        DataType::Number,
        DataType::Currency,
        DataType::Percentage,
        DataType::Blank,
        DataType::Empty,
        DataType::Error,
        DataType::Bool,
    ];

    /// The physical category this semantic type is stored as.
    pub fn category(self) -> CellCategory {
        match self {
            DataType::Date | DataType::Time | DataType::DateTime => CellCategory::Date,
            DataType::Text => CellCategory::Text,
            DataType::Number | DataType::Currency | DataType::Percentage => CellCategory::Number,
            DataType::Blank | DataType::Empty => CellCategory::Empty,
            DataType::Error => CellCategory::Error,
            DataType::Bool => CellCategory::Bool,
        }
    }

    pub fn is_date(self) -> bool {
        self.category() == CellCategory::Date
    }

    pub fn is_number(self) -> bool {
        self.category() == CellCategory::Number
    }

    pub fn is_bool(self) -> bool {
        self == DataType::Bool
    }

    /// Canonical upper-case name (e.g. `DATE_TIME`).
    pub fn name(self) -> &'static str {
        match self {
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::DateTime => "DATE_TIME",
            DataType::Text => "TEXT",
            DataType::Number => "NUMBER",
            DataType::Currency => "CURRENCY",
            DataType::Percentage => "PERCENTAGE",
            DataType::Blank => "BLANK",
            DataType::Empty => "EMPTY",
            DataType::Error => "ERROR",
            DataType::Bool => "BOOL",
        }
    }

    /// Parse an optional type name; `None` and blank strings mean "not requested".
    pub fn parse_optional(name: Option<&str>) -> Result<Option<DataType>> {
        match name.map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => name.parse().map(Some),
        }
    }
}

impl FromStr for DataType {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "DATETIME" {
            return Ok(DataType::DateTime);
        }
        DataType::ALL
            .into_iter()
            .find(|dtype| dtype.name() == upper)
            .ok_or_else(|| FormatError::UnknownType(s.to_string()))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("DATE_TIME".parse::<DataType>().unwrap(), DataType::DateTime);
        assert_eq!("datetime".parse::<DataType>().unwrap(), DataType::DateTime);
        assert_eq!("number".parse::<DataType>().unwrap(), DataType::Number);
        assert_eq!(
            "DECIMAL".parse::<DataType>(),
            Err(FormatError::UnknownType("DECIMAL".to_string()))
        );
        assert_eq!(DataType::parse_optional(None).unwrap(), None);
        assert_eq!(DataType::parse_optional(Some(" ")).unwrap(), None);
    }

    #[test]
    fn test_names_round_trip() {
        for dtype in DataType::ALL {
            assert_eq!(dtype.name().parse::<DataType>().unwrap(), dtype);
        }
    }

    #[test]
    fn test_many_to_one_categories() {
        assert_eq!(DataType::Currency.category(), CellCategory::Number);
        assert_eq!(DataType::Percentage.category(), CellCategory::Number);
        assert_eq!(DataType::Time.category(), CellCategory::Date);
        assert_eq!(DataType::Blank.category(), CellCategory::Empty);
    }

    #[test]
    fn test_check_requested() {
        assert!(CellCategory::Number.check_requested(Some(DataType::Text)).is_ok());
        assert!(CellCategory::Number.check_requested(Some(DataType::Currency)).is_ok());
        assert!(CellCategory::Date.check_requested(None).is_ok());
        assert!(CellCategory::Empty.check_requested(Some(DataType::Bool)).is_ok());
        assert_eq!(
            CellCategory::Number.check_requested(Some(DataType::Bool)),
            Err(FormatError::TypeMismatch {
                category: CellCategory::Number,
                requested: DataType::Bool,
            })
        );
        assert!(CellCategory::Text.check_requested(Some(DataType::Date)).is_err());
    }
}
