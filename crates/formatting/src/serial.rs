//! Spreadsheet serial dates (1900 date system).
//!
//! Serial 1 is 1900-01-01 and the system keeps the historical phantom
//! 1900-02-29 (serial 60), so serials from 61 on count from 1899-12-30.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::date::DateValue;

const MS_PER_DAY: f64 = 86_400_000.0;
/// First serial past 9999-12-31, the last representable spreadsheet date.
const MAX_SERIAL: f64 = 2_958_466.0;

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

/// Convert a serial to a timestamp. Serials outside `0..=9999-12-31` have no date.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..MAX_SERIAL).contains(&serial) {
        return None;
    }
    let whole = serial.floor();
    let mut days = whole as i64;
    if days < 60 {
        // Before the phantom leap day the count starts one day later
        days += 1;
    }
    let millis = ((serial - whole) * MS_PER_DAY).round() as i64;
    epoch()
        .and_time(NaiveTime::MIN)
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::milliseconds(millis))
}

/// Convert a timestamp to a serial.
pub fn datetime_to_serial(dt: NaiveDateTime) -> f64 {
    let mut days = (dt.date() - epoch()).num_days();
    if days < 61 {
        days -= 1;
    }
    let whole = days as f64;
    whole + time_fraction(dt.time())
}

/// Serial for any date-family value; time-only values are the day fraction.
pub fn date_value_to_serial(value: &DateValue) -> f64 {
    match value {
        DateValue::Date(d) => datetime_to_serial(d.and_time(NaiveTime::MIN)),
        DateValue::Time(t) => time_fraction(*t),
        DateValue::DateTime(dt) => datetime_to_serial(*dt),
    }
}

fn time_fraction(t: NaiveTime) -> f64 {
    let ms =
        u64::from(t.num_seconds_from_midnight()) * 1000 + u64::from(t.nanosecond() / 1_000_000);
    let ms = ms as f64;
    ms / MS_PER_DAY
}
