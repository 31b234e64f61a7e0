use std::{borrow::Cow, sync::OnceLock};

use regex::Regex;

const MIN_DIGITS: usize = 7;
const MAX_DIGITS: usize = 15;

fn phone_columns() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)phone|mobile|cell|fax|tel|contact_no|contact_num|whatsapp")
            .expect("phone column pattern")
    })
}

/// Whether a column's name allows phone formatting at all.
pub fn is_phone_column(column: &str) -> bool {
    phone_columns().is_match(column)
}

fn is_phone_char(ch: char) -> bool {
    ch.is_ascii_digit() || matches!(ch, ' ' | '+' | '-' | '.' | '(' | ')')
}

/// Digits of a phone-shaped value, or `None` when the value is not one.
///
/// A value qualifies only when it consists exclusively of digits and the
/// separators `space + - . ( )`, with 7 to 15 digits in total.
pub fn phone_digits(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.chars().all(is_phone_char) {
        return None;
    }
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    (MIN_DIGITS..=MAX_DIGITS)
        .contains(&digits.len())
        .then_some(digits)
}

pub fn looks_like_phone(value: &str) -> bool {
    phone_digits(value).is_some()
}

fn format_national(digits: &str) -> String {
    format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
}

/// Formats a phone-shaped value; anything else is returned untouched.
///
/// Callers are responsible for the column-name gate ([`is_phone_column`]).
pub fn format_phone(value: &str) -> Cow<'_, str> {
    let Some(digits) = phone_digits(value) else {
        return Cow::Borrowed(value);
    };
    let formatted = match digits.len() {
        10 => format_national(&digits),
        11 if digits.starts_with('1') => format!("+1 {}", format_national(&digits[1..])),
        len if len >= 11 => {
            let (country, national) = digits.split_at(len - 10);
            format!("+{country} {}", format_national(national))
        }
        _ => return Cow::Borrowed(value),
    };
    if formatted == value {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(formatted)
    }
}
