use std::{borrow::Cow, sync::OnceLock};

use chrono::{Datelike, NaiveDate};
use regex::Regex;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;
const MIN_LEN: usize = 6;
const MAX_LEN: usize = 30;
const MAX_NUMERIC_DIGITS: usize = 8;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

struct DatePatterns {
    year_first: Regex,
    year_last: Regex,
    day_month_name: Regex,
    month_name_day: Regex,
}

fn patterns() -> &'static DatePatterns {
    static PATTERNS: OnceLock<DatePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| DatePatterns {
        year_first: Regex::new(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})$").expect("ymd pattern"),
        year_last: Regex::new(r"^(\d{1,2})[-/.](\d{1,2})[-/.](\d{4})$").expect("dmy pattern"),
        day_month_name: Regex::new(r"^(\d{1,2})(?:st|nd|rd|th)?[\s-]+([A-Za-z]{3,9})\.?,?[\s-]+(\d{4})$")
            .expect("day month-name pattern"),
        month_name_day: Regex::new(r"^([A-Za-z]{3,9})\.?[\s-]+(\d{1,2})(?:st|nd|rd|th)?,?[\s-]+(\d{4})$")
            .expect("month-name day pattern"),
    })
}

fn month_from_name(name: &str) -> Option<u32> {
    let lowered = name.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|month| month.starts_with(&lowered) && lowered.len() >= 3)
        .and_then(|idx| u32::try_from(idx + 1).ok())
}

fn build(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Resolves `a/b/yyyy`. Month-first unless the first part can only be a day.
fn resolve_ambiguous(first: &str, second: &str, year: &str) -> Option<NaiveDate> {
    let a: u32 = first.parse().ok()?;
    let b: u32 = second.parse().ok()?;
    let (month, day) = if a > 12 && b <= 12 { (b, a) } else { (a, b) };
    build(year, month, &day.to_string())
}

/// Parses a date-like value, returning the calendar date it denotes.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if !(MIN_LEN..=MAX_LEN).contains(&len) {
        return None;
    }
    if trimmed.chars().all(|ch| ch.is_ascii_digit()) && len > MAX_NUMERIC_DIGITS {
        return None;
    }
    let patterns = patterns();
    let parsed = if let Some(caps) = patterns.year_first.captures(trimmed) {
        let month: u32 = caps[2].parse().ok()?;
        build(&caps[1], month, &caps[3])
    } else if let Some(caps) = patterns.year_last.captures(trimmed) {
        resolve_ambiguous(&caps[1], &caps[2], &caps[3])
    } else if let Some(caps) = patterns.day_month_name.captures(trimmed) {
        build(&caps[3], month_from_name(&caps[2])?, &caps[1])
    } else if let Some(caps) = patterns.month_name_day.captures(trimmed) {
        build(&caps[3], month_from_name(&caps[1])?, &caps[2])
    } else {
        None
    }?;
    (MIN_YEAR..=MAX_YEAR).contains(&parsed.year()).then_some(parsed)
}

pub fn looks_like_date(value: &str) -> bool {
    parse_date(value).is_some()
}

/// Rewrites a date-like value as `YYYY-MM-DD`; other values pass through.
pub fn normalize_date(value: &str) -> Cow<'_, str> {
    match parse_date(value) {
        Some(date) => {
            let formatted = date.format("%Y-%m-%d").to_string();
            if formatted == value {
                Cow::Borrowed(value)
            } else {
                Cow::Owned(formatted)
            }
        }
        None => Cow::Borrowed(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_iso_like_dates() {
        assert_eq!(normalize_date("2024/1/5").as_ref(), "2024-01-05");
        assert_eq!(normalize_date("2024.01.05").as_ref(), "2024-01-05");
        assert!(matches!(normalize_date("2024-01-05"), Cow::Borrowed(_)));
    }

    #[test]
    fn month_first_is_default_for_ambiguous_dates() {
        assert_eq!(normalize_date("03/04/2024").as_ref(), "2024-03-04");
    }

    #[test]
    fn day_first_when_first_part_exceeds_twelve() {
        assert_eq!(normalize_date("25/12/2023").as_ref(), "2023-12-25");
        assert_eq!(normalize_date("12/25/2023").as_ref(), "2023-12-25");
    }

    #[test]
    fn parses_month_names() {
        assert_eq!(normalize_date("5 March 2021").as_ref(), "2021-03-05");
        assert_eq!(normalize_date("Mar 5, 2021").as_ref(), "2021-03-05");
        assert_eq!(normalize_date("September 30th 1999").as_ref(), "1999-09-30");
    }

    #[test]
    fn rejects_out_of_range_and_invalid() {
        assert!(!looks_like_date("1850-01-01"));
        assert!(!looks_like_date("2024-02-30"));
        assert!(!looks_like_date("31/31/2024"));
        assert!(!looks_like_date("Foo 5, 2021"));
    }

    #[test]
    fn large_integers_are_not_dates() {
        assert!(!looks_like_date("123456789"));
        assert!(!looks_like_date("20240105"));
        assert!(!looks_like_date("1234"));
    }
}
