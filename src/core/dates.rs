//! Date helpers
//! Formatting, tolerant parsing, inclusive day/month ranges, calendar arithmetic

use crate::error::{OfficeError, OfficeResult};
use chrono::format::{self as chrono_format, Parsed, StrftimeItems};
use chrono::{
    DateTime, Datelike, FixedOffset, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    Timelike,
};
use std::fmt::Write;

pub const PATTERN_DATETIME: &str = "%Y-%m-%d %H:%M:%S";
pub const PATTERN_DATE: &str = "%Y-%m-%d";
pub const PATTERN_MONTH: &str = "%Y-%m";

/// Patterns tried by [`parse_try`], first match wins
pub const PARSE_TRY_PATTERNS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y %m %d",
    "%Y %m-%d",
    "%Y-%m %d",
    "%Y-%m",
    "%Y %m",
    "%Y",
];

/// Days between 1899-12-30 (Excel serial 0) and 1970-01-01
const EXCEL_EPOCH_OFFSET_DAYS: f64 = 25_569.0;

/// First serial after Excel's nonexistent 1900-02-29
const EXCEL_FIRST_TRUE_SERIAL: f64 = 61.0;

/// Calendar field for [`add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

//==============================================================================
// Formatting
//==============================================================================

/// Format with an arbitrary strftime pattern
pub fn format(dt: &NaiveDateTime, pattern: &str) -> OfficeResult<String> {
    let mut out = String::new();
    write!(out, "{}", dt.format(pattern))
        .map_err(|_| OfficeError::DateParse(format!("Invalid format pattern '{}'", pattern)))?;
    Ok(out)
}

/// Format as `yyyy-MM-dd`
pub fn format_date(dt: &NaiveDateTime) -> String {
    dt.format(PATTERN_DATE).to_string()
}

/// Format as `yyyy-MM-dd HH:mm:ss`
pub fn format_all(dt: &NaiveDateTime) -> String {
    dt.format(PATTERN_DATETIME).to_string()
}

/// Format as `yyyy-MM`
pub fn format_month(dt: &NaiveDateTime) -> String {
    dt.format(PATTERN_MONTH).to_string()
}

//==============================================================================
// Parsing
//==============================================================================

/// Parse the leading part of `text` with `pattern`.
///
/// Text after the matched prefix is ignored, so `2020-02-03 04:05` parses
/// with `%Y-%m-%d`. Patterns that stop at the month or the year are
/// accepted; the missing fields default to the first day / first month.
/// Missing time fields default to midnight.
pub fn parse(text: &str, pattern: &str) -> OfficeResult<NaiveDateTime> {
    let text = text.trim();
    let parse_error = |reason: String| {
        OfficeError::DateParse(format!(
            "'{}' does not match pattern '{}': {}",
            text, pattern, reason
        ))
    };

    let mut parsed = Parsed::new();
    chrono_format::parse_and_remainder(&mut parsed, text, StrftimeItems::new(pattern))
        .map_err(|e| parse_error(e.to_string()))?;

    if parsed.to_naive_date().is_err() {
        // fields the pattern already set keep their value
        let _ = parsed.set_month(1);
        let _ = parsed.set_day(1);
    }
    let date = parsed
        .to_naive_date()
        .map_err(|e| parse_error(e.to_string()))?;
    let time = parsed.to_naive_time().unwrap_or(NaiveTime::MIN);
    Ok(date.and_time(time))
}

/// Try every pattern in [`PARSE_TRY_PATTERNS`] in order
pub fn parse_try(text: &str) -> Option<NaiveDateTime> {
    if text.trim().is_empty() {
        return None;
    }
    PARSE_TRY_PATTERNS
        .iter()
        .find_map(|pattern| parse(text, pattern).ok())
}

/// Re-format a date string from one pattern to another
pub fn convert_format(text: &str, from: &str, to: &str) -> OfficeResult<String> {
    format(&parse(text, from)?, to)
}

//==============================================================================
// Ranges
//==============================================================================

/// Every day from `start` to `end` inclusive as `yyyy-MM-dd`
pub fn gen_date_range(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    if start > end {
        return Vec::new();
    }
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| day.format(PATTERN_DATE).to_string())
        .collect()
}

/// [`gen_date_range`] over `yyyy-MM-dd` strings
pub fn gen_date_range_str(start: &str, end: &str) -> OfficeResult<Vec<String>> {
    let start = parse(start, PATTERN_DATE)?.date();
    let end = parse(end, PATTERN_DATE)?.date();
    Ok(gen_date_range(start, end))
}

/// Every month from `start` to `end` inclusive as `yyyy-MM`
pub fn gen_month_range(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    let mut current = first_day_of_month(start);
    let last = first_day_of_month(end);
    let mut months = Vec::new();

    while current <= last {
        months.push(current.format(PATTERN_MONTH).to_string());
        match current.checked_add_months(Months::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }
    months
}

/// [`gen_month_range`] over `yyyy-MM` strings (`2020-1` is accepted)
pub fn gen_month_range_str(start: &str, end: &str) -> OfficeResult<Vec<String>> {
    let start = parse(start, PATTERN_MONTH)?.date();
    let end = parse(end, PATTERN_MONTH)?.date();
    Ok(gen_month_range(start, end))
}

//==============================================================================
// Boundaries
//==============================================================================

fn end_of_day() -> NaiveTime {
    NaiveTime::MIN + TimeDelta::seconds(86_399)
}

fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date - TimeDelta::days(date.day0() as i64)
}

fn first_day_of_year(date: NaiveDate) -> NaiveDate {
    date - TimeDelta::days(date.ordinal0() as i64)
}

pub fn first_time_of_day(dt: &NaiveDateTime) -> NaiveDateTime {
    dt.date().and_time(NaiveTime::MIN)
}

pub fn last_time_of_day(dt: &NaiveDateTime) -> NaiveDateTime {
    dt.date().and_time(end_of_day())
}

pub fn first_time_of_month(dt: &NaiveDateTime) -> NaiveDateTime {
    first_day_of_month(dt.date()).and_time(NaiveTime::MIN)
}

/// Last day of the month at 23:59:59
pub fn last_time_of_month(dt: &NaiveDateTime) -> NaiveDateTime {
    let first = first_day_of_month(dt.date());
    let last = first + TimeDelta::days(month_days(dt) as i64 - 1);
    last.and_time(end_of_day())
}

pub fn first_time_of_year(dt: &NaiveDateTime) -> NaiveDateTime {
    first_day_of_year(dt.date()).and_time(NaiveTime::MIN)
}

/// December 31st at 23:59:59
pub fn last_time_of_year(dt: &NaiveDateTime) -> NaiveDateTime {
    first_day_of_year(dt.date())
        .checked_add_months(Months::new(12))
        .and_then(|next| next.pred_opt())
        .unwrap_or_else(|| dt.date())
        .and_time(end_of_day())
}

/// Number of days in the month of `dt`
pub fn month_days(dt: &NaiveDateTime) -> u32 {
    first_day_of_month(dt.date())
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

//==============================================================================
// Arithmetic
//==============================================================================

/// Shift `dt` by `amount` units of `field`.
///
/// Month and year shifts clamp the day to the target month (Jan 31 + 1 month = Feb 28/29).
pub fn add(dt: &NaiveDateTime, field: DateField, amount: i32) -> OfficeResult<NaiveDateTime> {
    let shifted = match field {
        DateField::Year => shift_months(dt, amount.checked_mul(12)),
        DateField::Month => shift_months(dt, Some(amount)),
        DateField::Week => TimeDelta::try_weeks(amount as i64).and_then(|d| dt.checked_add_signed(d)),
        DateField::Day => TimeDelta::try_days(amount as i64).and_then(|d| dt.checked_add_signed(d)),
        DateField::Hour => TimeDelta::try_hours(amount as i64).and_then(|d| dt.checked_add_signed(d)),
        DateField::Minute => {
            TimeDelta::try_minutes(amount as i64).and_then(|d| dt.checked_add_signed(d))
        }
        DateField::Second => {
            TimeDelta::try_seconds(amount as i64).and_then(|d| dt.checked_add_signed(d))
        }
    };
    shifted.ok_or_else(|| {
        OfficeError::Conversion(format!(
            "Date arithmetic out of range: {} {:?} {}",
            format_all(dt),
            field,
            amount
        ))
    })
}

fn shift_months(dt: &NaiveDateTime, months: Option<i32>) -> Option<NaiveDateTime> {
    let months = months?;
    if months >= 0 {
        dt.checked_add_months(Months::new(months as u32))
    } else {
        dt.checked_sub_months(Months::new(months.unsigned_abs()))
    }
}

/// Same moment one year earlier
pub fn last_year_same_time(dt: &NaiveDateTime) -> OfficeResult<NaiveDateTime> {
    add(dt, DateField::Year, -1)
}

/// Same moment one month earlier
pub fn last_month_same_time(dt: &NaiveDateTime) -> OfficeResult<NaiveDateTime> {
    add(dt, DateField::Month, -1)
}

/// Same moment one day earlier
pub fn last_day_same_time(dt: &NaiveDateTime) -> OfficeResult<NaiveDateTime> {
    add(dt, DateField::Day, -1)
}

/// `yyyy-MM` of the month before `ym`
pub fn previous_month(ym: &str) -> OfficeResult<String> {
    let dt = add(&parse(ym, PATTERN_MONTH)?, DateField::Month, -1)?;
    Ok(DateUnit::from(&dt).date_ym())
}

/// `yyyy-MM` of the same month one year before `ym`
pub fn same_month_last_year(ym: &str) -> OfficeResult<String> {
    let dt = add(&parse(ym, PATTERN_MONTH)?, DateField::Year, -1)?;
    Ok(DateUnit::from(&dt).date_ym())
}

/// `year * 100 + month`, e.g. 202403
pub fn date_ym_number(dt: &NaiveDateTime) -> i32 {
    dt.year() * 100 + dt.month() as i32
}

//==============================================================================
// Elapsed time and timestamps
//==============================================================================

/// Describe how long ago `dt` was relative to `now`, e.g. `1d 2h 3m 4s ago`
pub fn time_before(dt: &NaiveDateTime, now: &NaiveDateTime) -> String {
    let total = (*now - *dt).num_seconds().max(0);
    let days = total / 86_400;
    let hours = total % 86_400 / 3_600;
    let minutes = total % 3_600 / 60;
    let seconds = total % 60;

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")]
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{}{}", n, unit))
        .collect();

    if parts.is_empty() {
        "0s ago".to_string()
    } else {
        format!("{} ago", parts.join(" "))
    }
}

/// [`time_before`] against the local clock
pub fn time_before_now(dt: &NaiveDateTime) -> String {
    time_before(dt, &Local::now().naive_local())
}

/// Epoch milliseconds of a wall-clock time observed at `offset`
pub fn to_timestamp_millis(dt: &NaiveDateTime, offset: FixedOffset) -> i64 {
    dt.and_utc().timestamp_millis() - offset.local_minus_utc() as i64 * 1_000
}

/// Wall-clock time at `offset` for an epoch second count
pub fn from_timestamp_secs(secs: i64, offset: FixedOffset) -> OfficeResult<NaiveDateTime> {
    DateTime::from_timestamp(secs, 0)
        .map(|utc| utc.with_timezone(&offset).naive_local())
        .ok_or_else(|| OfficeError::Conversion(format!("Timestamp out of range: {}", secs)))
}

/// Excel 1900-system serial number (fraction = time of day).
///
/// Excel counts a 1900-02-29 that never existed, so dates before
/// 1900-03-01 are one lower than their distance from 1899-12-30.
pub fn to_excel_serial(dt: &NaiveDateTime) -> f64 {
    let utc = dt.and_utc();
    let seconds = utc.timestamp() as f64 + utc.timestamp_subsec_millis() as f64 / 1_000.0;
    let serial = seconds / 86_400.0 + EXCEL_EPOCH_OFFSET_DAYS;
    if serial < EXCEL_FIRST_TRUE_SERIAL {
        serial - 1.0
    } else {
        serial
    }
}

/// Inverse of [`to_excel_serial`], rounded to the second.
///
/// Serial 60 (the phantom 1900-02-29) reads as 1900-02-28.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    let serial = if serial < EXCEL_FIRST_TRUE_SERIAL - 1.0 {
        serial + 1.0
    } else {
        serial
    };
    let secs = ((serial - EXCEL_EPOCH_OFFSET_DAYS) * 86_400.0).round() as i64;
    DateTime::from_timestamp(secs, 0).map(|utc| utc.naive_utc())
}

//==============================================================================
// DateUnit
//==============================================================================

/// Broken-down calendar fields of a date-time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateUnit {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl DateUnit {
    pub fn parse(text: &str, pattern: &str) -> OfficeResult<Self> {
        Ok(Self::from(&parse(text, pattern)?))
    }

    /// `yyyy-MM`
    pub fn date_ym(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }

    /// First moment of this unit's month
    pub fn month_start(&self) -> OfficeResult<NaiveDateTime> {
        parse(&self.date_ym(), PATTERN_MONTH)
    }
}

impl From<&NaiveDateTime> for DateUnit {
    fn from(dt: &NaiveDateTime) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }
}
