use serde::{Deserialize, Serialize};

use crate::boolean::BoolFormat;
use crate::date::{DateFormat, DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT};
use crate::error::{FormatError, Result};
use crate::number::NumberFormat;

/// User-facing format settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub date_format: String,
    pub time_format: String,
    pub datetime_format: String,
    pub decimal_separator: String,
    pub thousand_separator: String,
    pub precision: usize,
    pub bool_format: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            decimal_separator: ".".to_string(),
            thousand_separator: ",".to_string(),
            precision: 2,
            bool_format: "Yes/No".to_string(),
        }
    }
}

/// The three formatters built from one [`FormatConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formats {
    pub date: DateFormat,
    pub number: NumberFormat,
    pub boolean: BoolFormat,
}

impl Formats {
    pub fn new(config: &FormatConfig) -> Result<Self> {
        if config.decimal_separator.is_empty() {
            return Err(FormatError::InvalidConfig(
                "decimal separator must not be empty".to_string(),
            ));
        }
        if config.decimal_separator == config.thousand_separator {
            return Err(FormatError::InvalidConfig(format!(
                "decimal and thousand separators are both '{}'",
                config.decimal_separator
            )));
        }
        let formats = Self {
            date: DateFormat::new(
                &config.date_format,
                &config.time_format,
                &config.datetime_format,
            ),
            number: NumberFormat::new(
                &config.decimal_separator,
                &config.thousand_separator,
                config.precision,
            ),
            boolean: BoolFormat::new(&config.bool_format)?,
        };
        tracing::debug!(
            "Formats: date={:?} time={:?} datetime={:?}",
            config.date_format,
            config.time_format,
            config.datetime_format
        );
        Ok(formats)
    }
}
