use std::{borrow::Cow, sync::OnceLock};

use regex::Regex;

const CURRENCY_SYMBOLS: [char; 6] = ['$', '€', '£', '¥', '₹', '₩'];

fn grouped_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^-?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?$").expect("grouped number pattern")
    })
}

fn plain_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+(?:\.\d+)?$").expect("plain number pattern"))
}

/// Strips currency symbols and thousands separators from numeric text.
///
/// Anything that does not reduce to a plain number is returned unchanged.
pub fn repair_number(value: &str) -> Cow<'_, str> {
    let trimmed = value.trim();
    if !trimmed.contains(CURRENCY_SYMBOLS) && !trimmed.contains(',') {
        return Cow::Borrowed(value);
    }
    let stripped: String = trimmed
        .chars()
        .filter(|ch| !CURRENCY_SYMBOLS.contains(ch))
        .collect();
    let stripped = stripped.trim();
    if !grouped_number().is_match(stripped) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(stripped.replace(',', ""))
}

/// Parses a cell as a number when it is plainly numeric.
pub fn parse_numeric(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if !plain_number().is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|parsed| parsed.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_currency_and_grouping() {
        assert_eq!(repair_number("$1,234.50").as_ref(), "1234.50");
        assert_eq!(repair_number("€ 12,000").as_ref(), "12000");
        assert_eq!(repair_number("-1,000,000").as_ref(), "-1000000");
        assert_eq!(repair_number("£99").as_ref(), "99");
    }

    #[test]
    fn leaves_non_numeric_text_alone() {
        assert_eq!(repair_number("Smith, John").as_ref(), "Smith, John");
        assert_eq!(repair_number("1,23").as_ref(), "1,23");
        assert_eq!(repair_number("$abc").as_ref(), "$abc");
        assert!(matches!(repair_number("1234.5"), Cow::Borrowed(_)));
    }

    #[test]
    fn parses_plain_numbers_only() {
        assert_eq!(parse_numeric("42"), Some(42.0));
        assert_eq!(parse_numeric(" -3.5 "), Some(-3.5));
        assert_eq!(parse_numeric("1e5"), None);
        assert_eq!(parse_numeric("12 apples"), None);
    }
}
