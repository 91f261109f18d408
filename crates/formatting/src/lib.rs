//! Format translation for xlrobot
//!
//! Converts between human-facing display patterns (`yyyy-mm-dd`,
//! `HH:MM:SS AM/PM`, `#,##0.00`, `Yes/No`) and native values, and maps the
//! semantic [`DataType`] names used by callers onto the physical
//! [`CellCategory`] a spreadsheet cell actually stores.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use xlrobot_formatting::{pattern_to_native, DataType, DateValue, Formats};
//!
//! assert_eq!(pattern_to_native("dd/mm/yyyy"), "%d/%m/%Y");
//!
//! let formats = Formats::default();
//! let date = DateValue::Date(NaiveDate::from_ymd_opt(2018, 5, 14).unwrap());
//! assert_eq!(formats.date.format(Some(DataType::Date), &date).unwrap(), "2018-05-14");
//! assert_eq!(formats.number.format(None, 5178.0), "5,178.00");
//! assert_eq!(formats.boolean.format(true), "Yes");
//! ```

mod boolean;
mod config;
mod data_type;
mod date;
mod error;
mod number;
mod serial;

pub use boolean::BoolFormat;
pub use config::{FormatConfig, Formats};
pub use data_type::{CellCategory, DataType};
pub use date::{pattern_to_native, DateFormat, DateValue};
pub use error::{FormatError, Result};
pub use number::NumberFormat;
pub use serial::{date_value_to_serial, datetime_to_serial, serial_to_datetime};
