//! Date helper tests

use chrono::{FixedOffset, NaiveDate, NaiveDateTime};
use officekit::core::dates::{self, DateField, DateUnit};
use officekit::OfficeError;
use pretty_assertions::assert_eq;

fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// PARSING AND FORMATTING
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_parse_try_pattern_order() {
    assert_eq!(dates::parse_try("2024-03-05 10:20:30"), Some(dt(2024, 3, 5, 10, 20, 30)));
    assert_eq!(dates::parse_try("2024-03-05"), Some(dt(2024, 3, 5, 0, 0, 0)));
    assert_eq!(dates::parse_try("2024/03/05"), Some(dt(2024, 3, 5, 0, 0, 0)));
    assert_eq!(dates::parse_try("2024 03-05"), Some(dt(2024, 3, 5, 0, 0, 0)));
    assert_eq!(dates::parse_try("2024-03"), Some(dt(2024, 3, 1, 0, 0, 0)));
    assert_eq!(dates::parse_try("2024"), Some(dt(2024, 1, 1, 0, 0, 0)));
}

#[test]
fn test_parse_try_rejects_garbage() {
    assert_eq!(dates::parse_try(""), None);
    assert_eq!(dates::parse_try("next tuesday"), None);
    assert_eq!(dates::parse_try("Q1 2024"), None);
}

#[test]
fn test_parse_try_accepts_matching_prefix() {
    assert_eq!(dates::parse_try("2020-02-03 04:05"), Some(dt(2020, 2, 3, 0, 0, 0)));
    assert_eq!(dates::parse_try("2020-02-03T04:05:06"), Some(dt(2020, 2, 3, 0, 0, 0)));
    assert_eq!(
        dates::parse_try("2020-02-03 04:05:06.789"),
        Some(dt(2020, 2, 3, 4, 5, 6))
    );
    assert_eq!(dates::parse_try("2020/02/03 (Mon)"), Some(dt(2020, 2, 3, 0, 0, 0)));
}

#[test]
fn test_parse_error_names_pattern() {
    match dates::parse("05.03.2024", dates::PATTERN_DATE) {
        Err(OfficeError::DateParse(msg)) => assert!(msg.contains("%Y-%m-%d")),
        other => panic!("expected DateParse, got {:?}", other),
    }
}

#[test]
fn test_format_helpers() {
    let t = dt(2024, 3, 5, 7, 8, 9);
    assert_eq!(dates::format_all(&t), "2024-03-05 07:08:09");
    assert_eq!(dates::format_date(&t), "2024-03-05");
    assert_eq!(dates::format_month(&t), "2024-03");
    assert_eq!(dates::format(&t, "%d/%m/%Y").unwrap(), "05/03/2024");
    assert_eq!(
        dates::convert_format("2024/03/05", "%Y/%m/%d", "%Y%m%d").unwrap(),
        "20240305"
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// RANGES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_date_range_inclusive_across_months() {
    assert_eq!(
        dates::gen_date_range(day(2024, 2, 28), day(2024, 3, 1)),
        vec!["2024-02-28", "2024-02-29", "2024-03-01"]
    );
    assert_eq!(
        dates::gen_date_range(day(2024, 1, 1), day(2024, 1, 1)),
        vec!["2024-01-01"]
    );
}

#[test]
fn test_reversed_ranges_are_empty() {
    assert!(dates::gen_date_range(day(2024, 1, 2), day(2024, 1, 1)).is_empty());
    assert!(dates::gen_month_range_str("2024-05", "2024-01").unwrap().is_empty());
}

#[test]
fn test_month_range_across_years() {
    assert_eq!(
        dates::gen_month_range_str("2023-11", "2024-02").unwrap(),
        vec!["2023-11", "2023-12", "2024-01", "2024-02"]
    );
    assert_eq!(
        dates::gen_month_range(day(2024, 1, 31), day(2024, 2, 1)),
        vec!["2024-01", "2024-02"]
    );
}

#[test]
fn test_range_str_rejects_bad_input() {
    assert!(dates::gen_date_range_str("2024-01-01", "soon").is_err());
}

// ═══════════════════════════════════════════════════════════════════════════
// ARITHMETIC AND BOUNDARIES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_month_shift_clamps_day() {
    let jan31 = dt(2024, 1, 31, 12, 0, 0);
    assert_eq!(
        dates::add(&jan31, DateField::Month, 1).unwrap(),
        dt(2024, 2, 29, 12, 0, 0)
    );
    assert_eq!(
        dates::last_year_same_time(&dt(2024, 2, 29, 0, 0, 0)).unwrap(),
        dt(2023, 2, 28, 0, 0, 0)
    );
    assert_eq!(
        dates::add(&jan31, DateField::Week, -1).unwrap(),
        dt(2024, 1, 24, 12, 0, 0)
    );
}

#[test]
fn test_previous_months() {
    assert_eq!(dates::previous_month("2024-01").unwrap(), "2023-12");
    assert_eq!(dates::same_month_last_year("2024-01").unwrap(), "2023-01");
    assert_eq!(dates::date_ym_number(&dt(2024, 3, 1, 0, 0, 0)), 202403);
}

#[test]
fn test_boundaries() {
    let t = dt(2024, 2, 10, 13, 14, 15);
    assert_eq!(dates::first_time_of_day(&t), dt(2024, 2, 10, 0, 0, 0));
    assert_eq!(dates::last_time_of_day(&t), dt(2024, 2, 10, 23, 59, 59));
    assert_eq!(dates::first_time_of_month(&t), dt(2024, 2, 1, 0, 0, 0));
    assert_eq!(dates::last_time_of_month(&t), dt(2024, 2, 29, 23, 59, 59));
    assert_eq!(dates::first_time_of_year(&t), dt(2024, 1, 1, 0, 0, 0));
    assert_eq!(dates::last_time_of_year(&t), dt(2024, 12, 31, 23, 59, 59));
    assert_eq!(dates::month_days(&dt(2023, 2, 1, 0, 0, 0)), 28);
}

#[test]
fn test_time_before() {
    let now = dt(2024, 1, 2, 3, 4, 5);
    assert_eq!(dates::time_before(&dt(2024, 1, 1, 1, 4, 0), &now), "1d 2h 5s ago");
    assert_eq!(dates::time_before(&now, &now), "0s ago");
}

#[test]
fn test_timestamps_and_serials() {
    let east8 = FixedOffset::east_opt(8 * 3600).unwrap();
    let t = dt(2024, 1, 1, 8, 0, 0);
    assert_eq!(dates::to_timestamp_millis(&t, east8), 1_704_067_200_000);
    assert_eq!(dates::from_timestamp_secs(1_704_067_200, east8).unwrap(), t);

    let noon = dt(2024, 1, 1, 12, 0, 0);
    assert_eq!(dates::to_excel_serial(&noon), 45292.5);
    assert_eq!(dates::from_excel_serial(45292.5), Some(noon));
}

#[test]
fn test_date_unit() {
    let unit = DateUnit::parse("2024-07-09 18:30:00", dates::PATTERN_DATETIME).unwrap();
    assert_eq!((unit.year, unit.month, unit.day, unit.hour), (2024, 7, 9, 18));
    assert_eq!(unit.date_ym(), "2024-07");
    assert_eq!(unit.month_start().unwrap(), dt(2024, 7, 1, 0, 0, 0));
}
