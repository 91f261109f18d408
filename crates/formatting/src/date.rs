use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt::Write as _;

use crate::data_type::DataType;
use crate::error::{FormatError, Result};

pub const DEFAULT_DATE_FORMAT: &str = "yyyy-mm-dd";
pub const DEFAULT_TIME_FORMAT: &str = "HH:MM:SS AM/PM";
pub const DEFAULT_DATETIME_FORMAT: &str = "yyyy-mm-dd HH:MM";

/// A date-family value: calendar date, time of day, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl DateValue {
    /// The semantic type matching this value's shape.
    pub fn data_type(&self) -> DataType {
        match self {
            DateValue::Date(_) => DataType::Date,
            DateValue::Time(_) => DataType::Time,
            DateValue::DateTime(_) => DataType::DateTime,
        }
    }

    /// Pick the shape for a stored date cell.
    ///
    /// A requested date type wins; otherwise a serial below one day is a
    /// time, a whole serial is a date and anything else a date-time.
    pub fn classify(dt: NaiveDateTime, serial: f64, requested: Option<DataType>) -> DateValue {
        match requested {
            Some(DataType::Date) => DateValue::Date(dt.date()),
            Some(DataType::Time) => DateValue::Time(dt.time()),
            Some(DataType::DateTime) => DateValue::DateTime(dt),
            _ if serial < 1.0 => DateValue::Time(dt.time()),
            _ if serial.fract() == 0.0 => DateValue::Date(dt.date()),
            _ => DateValue::DateTime(dt),
        }
    }

    /// Reshape the value for a requested type. Non-date types leave it untouched.
    #[must_use]
    pub fn coerce(self, requested: Option<DataType>) -> DateValue {
        let dt = self.to_datetime();
        match (requested, self) {
            (Some(DataType::Date), DateValue::Date(_) | DateValue::DateTime(_)) => {
                DateValue::Date(dt.date())
            }
            (Some(DataType::Time), _) => DateValue::Time(dt.time()),
            (Some(DataType::DateTime), DateValue::Date(_) | DateValue::DateTime(_)) => {
                DateValue::DateTime(dt)
            }
            _ => self,
        }
    }

    /// Anchor the value to a full timestamp. Time-only values sit on the
    /// spreadsheet epoch day.
    pub fn to_datetime(self) -> NaiveDateTime {
        match self {
            DateValue::Date(d) => d.and_time(NaiveTime::MIN),
            DateValue::Time(t) => NaiveDate::from_ymd_opt(1899, 12, 31)
                .unwrap_or(NaiveDate::MIN)
                .and_time(t),
            DateValue::DateTime(dt) => dt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Date,
    Time,
    DateTime,
}

fn slot(dtype: Option<DataType>, value: Option<&DateValue>) -> Slot {
    match (dtype, value) {
        (Some(DataType::Time), _) => Slot::Time,
        (Some(DataType::DateTime), _) => Slot::DateTime,
        (Some(DataType::Date), _) => Slot::Date,
        (_, Some(DateValue::Time(_))) => Slot::Time,
        (_, Some(DateValue::DateTime(_))) => Slot::DateTime,
        _ => Slot::Date,
    }
}

/// Date, time and date-time display patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    date_format: String,
    time_format: String,
    datetime_format: String,
    native_date: String,
    native_time: String,
    native_datetime: String,
}

impl Default for DateFormat {
    fn default() -> Self {
        Self::new(
            DEFAULT_DATE_FORMAT,
            DEFAULT_TIME_FORMAT,
            DEFAULT_DATETIME_FORMAT,
        )
    }
}

impl DateFormat {
    pub fn new(date_format: &str, time_format: &str, datetime_format: &str) -> Self {
        Self {
            date_format: date_format.to_string(),
            time_format: time_format.to_string(),
            datetime_format: datetime_format.to_string(),
            native_date: pattern_to_native(date_format),
            native_time: pattern_to_native(time_format),
            native_datetime: pattern_to_native(datetime_format),
        }
    }

    /// Spreadsheet number-format code for a date cell.
    ///
    /// Time and date-time codes are lower-cased, which is how spreadsheet
    /// applications expect `hh:mm` to be spelled.
    pub fn excel_pattern(&self, dtype: Option<DataType>, value: Option<&DateValue>) -> String {
        match slot(dtype, value) {
            Slot::Date => self.date_format.clone(),
            Slot::Time => self.time_format.to_lowercase(),
            Slot::DateTime => self.datetime_format.to_lowercase(),
        }
    }

    /// The strftime pattern used to render or parse.
    pub fn native_pattern(&self, dtype: Option<DataType>, value: Option<&DateValue>) -> &str {
        match slot(dtype, value) {
            Slot::Date => &self.native_date,
            Slot::Time => &self.native_time,
            Slot::DateTime => &self.native_datetime,
        }
    }

    /// Render a value with the pattern chosen by `dtype` (or the value's own shape).
    pub fn format(&self, dtype: Option<DataType>, value: &DateValue) -> Result<String> {
        let pattern = self.native_pattern(dtype, Some(value));
        let mut out = String::new();
        write!(out, "{}", value.to_datetime().format(pattern))
            .map_err(|_| FormatError::InvalidPattern(pattern.to_string()))?;
        Ok(out)
    }

    /// Parse text with the pattern selected by `dtype`.
    pub fn parse_str(&self, dtype: Option<DataType>, text: &str) -> Result<DateValue> {
        let pattern = self.native_pattern(dtype, None);
        let text = text.trim();
        let invalid = || FormatError::InvalidValue {
            value: text.to_string(),
            expected: dtype.unwrap_or(DataType::Date),
        };
        match slot(dtype, None) {
            Slot::Date => NaiveDate::parse_from_str(text, pattern)
                .map(DateValue::Date)
                .map_err(|_| invalid()),
            Slot::Time => NaiveTime::parse_from_str(text, pattern)
                .map(DateValue::Time)
                .map_err(|_| invalid()),
            Slot::DateTime => NaiveDateTime::parse_from_str(text, pattern)
                .map(DateValue::DateTime)
                .map_err(|_| invalid()),
        }
    }
}

/// Translate a spreadsheet-style date pattern into a strftime pattern.
///
/// Lower-case `y`, `m`, `d` are year, month and day; upper-case `H`, `M`, `S`
/// are hour, minute and second. An `AM/PM` or `A/P` marker switches hours to
/// the 12-hour clock. Existing `%` directives pass through untouched, so the
/// translation is idempotent.
pub fn pattern_to_native(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let upper = pattern.to_ascii_uppercase();
    let twelve_hour = upper.contains("AM/PM") || upper.contains("A/P");

    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '%' {
            out.push('%');
            i += 1;
            if chars.get(i) == Some(&'-') {
                out.push('-');
                i += 1;
            }
            if let Some(&next) = chars.get(i) {
                out.push(next);
                i += 1;
            }
            continue;
        }
        if let Some(len) = meridiem_len(&chars[i..]) {
            out.push_str("%p");
            i += len;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        i += run;
        match c {
            'y' => push_run(&mut out, run, &[(4, "%Y"), (2, "%y")], "y"),
            'm' => push_run(&mut out, run, &[(4, "%B"), (3, "%b"), (2, "%m")], "%-m"),
            'd' => push_run(&mut out, run, &[(2, "%d")], "%-d"),
            'H' => {
                let (full, short) = if twelve_hour {
                    ("%I", "%-I")
                } else {
                    ("%H", "%-H")
                };
                push_run(&mut out, run, &[(2, full)], short);
            }
            'M' => push_run(&mut out, run, &[(2, "%M")], "%-M"),
            'S' => push_run(&mut out, run, &[(2, "%S")], "%-S"),
            _ => (0..run).for_each(|_| out.push(c)),
        }
    }
    out
}

fn meridiem_len(rest: &[char]) -> Option<usize> {
    let starts_with = |marker: &str| {
        marker.len() <= rest.len()
            && marker
                .chars()
                .zip(rest)
                .all(|(m, r)| m == r.to_ascii_uppercase())
    };
    if starts_with("AM/PM") {
        Some(5)
    } else if starts_with("A/P") {
        Some(3)
    } else {
        None
    }
}

/// Emit a run of one pattern letter, consuming the longest token first.
fn push_run(out: &mut String, mut run: usize, tokens: &[(usize, &str)], single: &str) {
    for &(width, directive) in tokens {
        while run >= width {
            out.push_str(directive);
            run -= width;
        }
    }
    for _ in 0..run {
        out.push_str(single);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_to_native_dates() {
        assert_eq!(pattern_to_native("yyyy-mm-dd"), "%Y-%m-%d");
        assert_eq!(pattern_to_native("yyyymmdd"), "%Y%m%d");
        assert_eq!(pattern_to_native("dd/mm/yyyy"), "%d/%m/%Y");
        assert_eq!(pattern_to_native("mmm, dd yyyy"), "%b, %d %Y");
        assert_eq!(pattern_to_native("mmmm d, yy"), "%B %-d, %y");
        assert_eq!(pattern_to_native("m/d/yy"), "%-m/%-d/%y");
    }

    #[test]
    fn test_pattern_to_native_times() {
        assert_eq!(pattern_to_native("HH:MM:SS"), "%H:%M:%S");
        assert_eq!(pattern_to_native("HH.MM.SS"), "%H.%M.%S");
        assert_eq!(pattern_to_native("HH:MM:SS AM/PM"), "%I:%M:%S %p");
        assert_eq!(pattern_to_native("HHMMSS-A/P"), "%I%M%S-%p");
        assert_eq!(pattern_to_native("H:M:S"), "%-H:%-M:%-S");
        assert_eq!(pattern_to_native("yyyy mm dd HH:MM:SS"), "%Y %m %d %H:%M:%S");
    }

    #[test]
    fn test_pattern_to_native_is_idempotent() {
        for pattern in ["yyyy-mm-dd", "HH:MM:SS AM/PM", "m/d/yy", "yyyy-mm-dd HH:MM"] {
            let once = pattern_to_native(pattern);
            assert_eq!(pattern_to_native(&once), once);
        }
    }

    #[test]
    fn test_excel_pattern_selection() {
        let fmt = DateFormat::default();
        let time = DateValue::Time(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(fmt.excel_pattern(Some(DataType::Date), None), "yyyy-mm-dd");
        assert_eq!(fmt.excel_pattern(Some(DataType::Time), None), "hh:mm:ss am/pm");
        assert_eq!(fmt.excel_pattern(None, Some(&time)), "hh:mm:ss am/pm");
        assert_eq!(fmt.excel_pattern(Some(DataType::DateTime), None), "yyyy-mm-dd hh:mm");
        assert_eq!(fmt.excel_pattern(None, None), "yyyy-mm-dd");
    }

    #[test]
    fn test_format_and_parse() {
        let fmt = DateFormat::default();
        let time = fmt.parse_str(Some(DataType::Time), "08:00:00 AM").unwrap();
        assert_eq!(time, DateValue::Time(NaiveTime::from_hms_opt(8, 0, 0).unwrap()));
        assert_eq!(fmt.format(None, &time).unwrap(), "08:00:00 AM");

        let dt = fmt.parse_str(Some(DataType::DateTime), "2018-01-02 22:00").unwrap();
        assert_eq!(fmt.format(None, &dt).unwrap(), "2018-01-02 22:00");

        let date = fmt.parse_str(None, "2018-01-01").unwrap();
        assert_eq!(date, DateValue::Date(NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()));
        assert!(fmt.parse_str(Some(DataType::Date), "01/01/2018").is_err());
    }

    #[test]
    fn test_invalid_native_pattern_is_an_error() {
        let fmt = DateFormat::new("%Q", DEFAULT_TIME_FORMAT, DEFAULT_DATETIME_FORMAT);
        let date = DateValue::Date(NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert!(matches!(
            fmt.format(None, &date),
            Err(FormatError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_coerce() {
        let dt = NaiveDate::from_ymd_opt(2018, 1, 2)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        let value = DateValue::DateTime(dt);
        assert_eq!(value.coerce(Some(DataType::Date)), DateValue::Date(dt.date()));
        assert_eq!(value.coerce(Some(DataType::Time)), DateValue::Time(dt.time()));
        assert_eq!(value.coerce(Some(DataType::Text)), value);
    }
}
