//! Helpers for "YYYY-MM" period keys.

use chrono::{Datelike, Local, NaiveDate};

/// The current local month as "YYYY-MM".
pub fn current() -> String {
    Local::now().format("%Y-%m").to_string()
}

fn first_day(month: &str) -> Option<NaiveDate> {
    if month.len() != 7 {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").ok()
}

pub fn is_valid(month: &str) -> bool {
    first_day(month).is_some()
}

/// Normalize user input into "YYYY-MM".
/// Accepts "2024-01", "2024-1", "01" and "1"; the short forms take their year from `base`.
pub fn parse(input: &str, base: &str) -> Option<String> {
    let input = input.trim();
    let candidate = if input.len() <= 2 {
        let year = base.get(..4)?;
        format!("{year}-{input:0>2}")
    } else {
        let (year, month) = input.split_once('-')?;
        format!("{year}-{month:0>2}")
    };
    is_valid(&candidate).then_some(candidate)
}

/// Move `month` by `delta` months.
pub fn shift(month: &str, delta: i32) -> Option<String> {
    let date = first_day(month)?;
    let total = date.year() * 12 + date.month0() as i32 + delta;
    let year = total.div_euclid(12);
    let month0 = total.rem_euclid(12) as u32;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).map(|d| d.format("%Y-%m").to_string())
}

/// Human label, e.g. "March 2025". Falls back to the raw key.
pub fn label(month: &str) -> String {
    first_day(month)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| month.to_string())
}

/// Whether a "YYYY-MM-DD" date falls inside `month`.
pub fn contains(month: &str, date: &str) -> bool {
    date.get(..7) == Some(month)
}
