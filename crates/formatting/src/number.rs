use crate::data_type::DataType;
use crate::error::{FormatError, Result};

/// Decimal rendering with configurable separators and precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    decimal_separator: String,
    thousand_separator: String,
    precision: usize,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::new(".", ",", 2)
    }
}

impl NumberFormat {
    pub fn new(decimal_separator: &str, thousand_separator: &str, precision: usize) -> Self {
        Self {
            decimal_separator: decimal_separator.to_string(),
            thousand_separator: thousand_separator.to_string(),
            precision,
        }
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Spreadsheet number-format code: `#,##0.00` by default, `0.00%` for percentages.
    pub fn excel_pattern(&self, dtype: Option<DataType>) -> String {
        let decimals = if self.precision > 0 {
            format!(".{}", "0".repeat(self.precision))
        } else {
            String::new()
        };
        match dtype {
            Some(DataType::Percentage) => format!("0{decimals}%"),
            _ if self.thousand_separator.is_empty() => format!("0{decimals}"),
            _ => format!("#,##0{decimals}"),
        }
    }

    /// Render a number, e.g. `5178.0` as `5,178.00`.
    ///
    /// Percentages are scaled by 100 and suffixed with `%`; currency renders
    /// like a plain number.
    pub fn format(&self, dtype: Option<DataType>, value: f64) -> String {
        match dtype {
            Some(DataType::Percentage) => format!("{}%", self.render(value * 100.0)),
            _ => self.render(value),
        }
    }

    /// Parse text written with this format's separators.
    pub fn parse_str(&self, dtype: Option<DataType>, text: &str) -> Result<f64> {
        let trimmed = text.trim();
        let (body, percent) = match trimmed.strip_suffix('%') {
            Some(body) if dtype == Some(DataType::Percentage) => (body.trim_end(), true),
            _ => (trimmed, false),
        };
        let mut normalized = body.to_string();
        if !self.thousand_separator.is_empty() {
            normalized = normalized.replace(&self.thousand_separator, "");
        }
        if self.decimal_separator != "." {
            normalized = normalized.replace(&self.decimal_separator, ".");
        }
        let value: f64 = normalized.parse().map_err(|_| FormatError::InvalidValue {
            value: text.to_string(),
            expected: dtype.unwrap_or(DataType::Number),
        })?;
        Ok(if percent { value / 100.0 } else { value })
    }

    fn render(&self, value: f64) -> String {
        let fixed = format!("{:.*}", self.precision, value);
        if !value.is_finite() {
            return fixed;
        }
        let (negative, digits) = match fixed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, fixed.as_str()),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (digits, None),
        };

        let mut out = String::with_capacity(fixed.len() + int_part.len() / 3);
        if negative {
            out.push('-');
        }
        out.push_str(&self.group_thousands(int_part));
        if let Some(frac_part) = frac_part {
            out.push_str(&self.decimal_separator);
            out.push_str(frac_part);
        }
        out
    }

    fn group_thousands(&self, int_part: &str) -> String {
        if self.thousand_separator.is_empty() {
            return int_part.to_string();
        }
        let len = int_part.len();
        let mut out = String::with_capacity(len + len / 3 * self.thousand_separator.len());
        for (idx, ch) in int_part.chars().enumerate() {
            if idx > 0 && (len - idx) % 3 == 0 {
                out.push_str(&self.thousand_separator);
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rendering() {
        let fmt = NumberFormat::default();
        assert_eq!(fmt.format(None, 5178.0), "5,178.00");
        assert_eq!(fmt.format(None, 57.0), "57.00");
        assert_eq!(fmt.format(Some(DataType::Number), 25.5), "25.50");
        assert_eq!(fmt.format(None, -1_234_567.891), "-1,234,567.89");
        assert_eq!(fmt.format(None, 0.0), "0.00");
        assert_eq!(fmt.format(Some(DataType::Currency), 999.999), "1,000.00");
    }

    #[test]
    fn test_custom_separators() {
        let fmt = NumberFormat::new(",", ".", 3);
        assert_eq!(fmt.format(None, 1234.5), "1.234,500");
        assert_eq!(fmt.parse_str(None, "1.234,5").unwrap(), 1234.5);

        let plain = NumberFormat::new(".", "", 0);
        assert_eq!(plain.format(None, 1234.5), "1234");
        assert_eq!(plain.excel_pattern(None), "0");
    }

    #[test]
    fn test_percentage() {
        let fmt = NumberFormat::default();
        assert_eq!(fmt.format(Some(DataType::Percentage), 0.125), "12.50%");
        assert_eq!(fmt.excel_pattern(Some(DataType::Percentage)), "0.00%");
        assert_eq!(fmt.parse_str(Some(DataType::Percentage), "12.5%").unwrap(), 0.125);
    }

    #[test]
    fn test_parse_errors() {
        let fmt = NumberFormat::default();
        assert_eq!(fmt.parse_str(None, " 5,178.00 ").unwrap(), 5178.0);
        assert_eq!(
            fmt.parse_str(Some(DataType::Number), "abc"),
            Err(FormatError::InvalidValue {
                value: "abc".to_string(),
                expected: DataType::Number,
            })
        );
    }

    #[test]
    fn test_excel_pattern() {
        assert_eq!(NumberFormat::default().excel_pattern(None), "#,##0.00");
        assert_eq!(NumberFormat::new(".", ",", 0).excel_pattern(None), "#,##0");
    }
}
