use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use xlrobot_formatting::{CellCategory, DataType, DateValue};

/// A value read from a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    /// Error label such as `#DIV/0!`
    Error(String),
}

impl CellValue {
    /// The physical category of the stored value
    #[must_use]
    pub fn category(&self) -> CellCategory {
        match self {
            CellValue::Empty => CellCategory::Empty,
            CellValue::Text(_) => CellCategory::Text,
            CellValue::Number(_) => CellCategory::Number,
            CellValue::Bool(_) => CellCategory::Bool,
            CellValue::Date(_) | CellValue::Time(_) | CellValue::DateTime(_) => CellCategory::Date,
            CellValue::Error(_) => CellCategory::Error,
        }
    }

    /// Check if the value is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Empty cells, empty text, zero and `false` are falsy
    #[must_use]
    pub fn is_falsy(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(n) => *n == 0.0,
            CellValue::Bool(b) => !b,
            _ => false,
        }
    }

    /// Try to get the value as a date-family value
    #[must_use]
    pub fn as_date_value(&self) -> Option<DateValue> {
        match self {
            CellValue::Date(d) => Some(DateValue::Date(*d)),
            CellValue::Time(t) => Some(DateValue::Time(*t)),
            CellValue::DateTime(dt) => Some(DateValue::DateTime(*dt)),
            _ => None,
        }
    }
}

impl From<DateValue> for CellValue {
    fn from(value: DateValue) -> Self {
        match value {
            DateValue::Date(d) => CellValue::Date(d),
            DateValue::Time(t) => CellValue::Time(t),
            DateValue::DateTime(dt) => CellValue::DateTime(dt),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) | CellValue::Error(s) => write!(f, "{s}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Time(t) => write!(f, "{t}"),
            CellValue::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// A value handed to the writer
#[derive(Debug, Clone, PartialEq)]
pub enum WriteValue {
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Text(String),
}

impl WriteValue {
    /// The semantic type used when the caller does not request one
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            WriteValue::Bool(_) => DataType::Bool,
            WriteValue::Number(_) => DataType::Number,
            WriteValue::Date(_) => DataType::Date,
            WriteValue::Time(_) => DataType::Time,
            WriteValue::DateTime(_) => DataType::DateTime,
            WriteValue::Text(_) => DataType::Text,
        }
    }

    /// Classify loosely typed text.
    /// Tries: bool literal -> ISO date/time -> number -> text
    #[must_use]
    pub fn infer(s: &str) -> WriteValue {
        let trimmed = s.trim();

        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return WriteValue::Bool(true),
            "false" => return WriteValue::Bool(false),
            _ => {}
        }

        for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, pattern) {
                return WriteValue::DateTime(dt);
            }
        }
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return WriteValue::Date(d);
        }
        for pattern in ["%H:%M:%S", "%H:%M"] {
            if let Ok(t) = NaiveTime::parse_from_str(trimmed, pattern) {
                return WriteValue::Time(t);
            }
        }

        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return WriteValue::Number(n);
            }
        }

        WriteValue::Text(s.to_string())
    }

    pub(crate) fn as_date_value(&self) -> Option<DateValue> {
        match self {
            WriteValue::Date(d) => Some(DateValue::Date(*d)),
            WriteValue::Time(t) => Some(DateValue::Time(*t)),
            WriteValue::DateTime(dt) => Some(DateValue::DateTime(*dt)),
            _ => None,
        }
    }
}

impl fmt::Display for WriteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteValue::Bool(b) => write!(f, "{b}"),
            WriteValue::Number(n) => write!(f, "{n}"),
            WriteValue::Date(d) => write!(f, "{d}"),
            WriteValue::Time(t) => write!(f, "{t}"),
            WriteValue::DateTime(dt) => write!(f, "{dt}"),
            WriteValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for WriteValue {
    fn from(b: bool) -> Self {
        WriteValue::Bool(b)
    }
}

impl From<f64> for WriteValue {
    fn from(n: f64) -> Self {
        WriteValue::Number(n)
    }
}

impl From<i32> for WriteValue {
    fn from(n: i32) -> Self {
        WriteValue::Number(f64::from(n))
    }
}

impl From<NaiveDate> for WriteValue {
    fn from(d: NaiveDate) -> Self {
        WriteValue::Date(d)
    }
}

impl From<NaiveTime> for WriteValue {
    fn from(t: NaiveTime) -> Self {
        WriteValue::Time(t)
    }
}

impl From<NaiveDateTime> for WriteValue {
    fn from(dt: NaiveDateTime) -> Self {
        WriteValue::DateTime(dt)
    }
}

impl From<String> for WriteValue {
    fn from(s: String) -> Self {
        WriteValue::Text(s)
    }
}

impl From<&str> for WriteValue {
    fn from(s: &str) -> Self {
        WriteValue::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_priority() {
        assert_eq!(WriteValue::infer("TRUE"), WriteValue::Bool(true));
        assert_eq!(WriteValue::infer("false"), WriteValue::Bool(false));
        assert_eq!(
            WriteValue::infer("2018-01-01"),
            WriteValue::Date(NaiveDate::from_ymd_opt(2018, 1, 1).unwrap())
        );
        assert_eq!(
            WriteValue::infer("08:00:00"),
            WriteValue::Time(NaiveTime::from_hms_opt(8, 0, 0).unwrap())
        );
        assert!(matches!(
            WriteValue::infer("2018-01-02 22:00"),
            WriteValue::DateTime(_)
        ));
        assert_eq!(WriteValue::infer("25.5"), WriteValue::Number(25.5));
        assert_eq!(WriteValue::infer("1"), WriteValue::Number(1.0));
        assert_eq!(WriteValue::infer("NaN"), WriteValue::Text("NaN".to_string()));
        assert_eq!(WriteValue::infer("Name"), WriteValue::Text("Name".to_string()));
    }

    #[test]
    fn test_falsy_values() {
        assert!(CellValue::Empty.is_falsy());
        assert!(CellValue::Text(String::new()).is_falsy());
        assert!(CellValue::Number(0.0).is_falsy());
        assert!(CellValue::Bool(false).is_falsy());
        assert!(!CellValue::Number(0.5).is_falsy());
        assert!(!CellValue::Error("#N/A".to_string()).is_falsy());
    }

    #[test]
    fn test_categories() {
        assert_eq!(CellValue::Number(1.0).category(), CellCategory::Number);
        assert_eq!(
            CellValue::Time(NaiveTime::from_hms_opt(1, 0, 0).unwrap()).category(),
            CellCategory::Date
        );
        assert_eq!(WriteValue::from(2.5).data_type(), DataType::Number);
        assert_eq!(WriteValue::from("x").data_type(), DataType::Text);
    }
}
