//! Lenient date parsing for cutoff and launch columns

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

use super::sheet::Cell;

/// Text formats accepted for dates, tried in order (day-first, pt-BR)
const TEXT_FORMATS: &[&str] = &["%d/%m/%y", "%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Largest serial Excel accepts (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Serial of Excel's nonexistent 1900-02-29
const PHANTOM_LEAP_DAY: f64 = 60.0;

/// Years a workbook date cell can hold
const EXCEL_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

/// True when the date can be written back to a workbook
pub fn in_excel_range(date: NaiveDate) -> bool {
    EXCEL_YEARS.contains(&date.year())
}

/// Outcome of reading one date cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateCell {
    Date(NaiveDate),
    /// Nothing in the cell
    Missing,
    /// Something in the cell that is not a date; carries the raw text
    Invalid(String),
}

pub fn parse_cell(cell: &Cell) -> DateCell {
    match cell {
        Cell::Empty => DateCell::Missing,
        Cell::Date(d) if in_excel_range(*d) => DateCell::Date(*d),
        Cell::Date(_) => DateCell::Invalid(cell.to_string_value()),
        Cell::Number(serial) => match from_excel_serial(*serial) {
            Some(d) => DateCell::Date(d),
            None => DateCell::Invalid(cell.to_string_value()),
        },
        Cell::Text(s) if s.trim().is_empty() => DateCell::Missing,
        Cell::Text(s) => match parse_text(s) {
            Some(d) => DateCell::Date(d),
            None => DateCell::Invalid(s.trim().to_string()),
        },
        Cell::Bool(_) => DateCell::Invalid(cell.to_string_value()),
    }
}

/// Parse a textual date or datetime, dropping any time part.
/// Dates outside the years a workbook can hold are rejected.
pub fn parse_text(s: &str) -> Option<NaiveDate> {
    parse_any(s.trim()).filter(|d| in_excel_range(*d))
}

fn parse_any(s: &str) -> Option<NaiveDate> {
    for format in TEXT_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Some(d);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    None
}

/// Convert an Excel serial day number (1900 date system) to a date.
///
/// Serial 1 is 1900-01-01. Serial 60 is the 1900-02-29 Excel pretends
/// exists and has no date.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let day = serial.floor();
    if day == PHANTOM_LEAP_DAY {
        return None;
    }
    let epoch = if day < PHANTOM_LEAP_DAY {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_days(Days::new(day as u64))
}
