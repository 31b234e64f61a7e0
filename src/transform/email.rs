use std::{borrow::Cow, sync::OnceLock};

use regex::Regex;

/// Common domain misspellings and their corrections.
const DOMAIN_TYPOS: &[(&str, &str)] = &[
    ("gmial.com", "gmail.com"),
    ("gmal.com", "gmail.com"),
    ("gmai.com", "gmail.com"),
    ("gamil.com", "gmail.com"),
    ("gnail.com", "gmail.com"),
    ("gmaill.com", "gmail.com"),
    ("gmail.co", "gmail.com"),
    ("gmail.con", "gmail.com"),
    ("gmail.cm", "gmail.com"),
    ("hotmial.com", "hotmail.com"),
    ("hotmal.com", "hotmail.com"),
    ("hotmai.com", "hotmail.com"),
    ("hotmail.con", "hotmail.com"),
    ("hotmail.co", "hotmail.com"),
    ("yahooo.com", "yahoo.com"),
    ("yaho.com", "yahoo.com"),
    ("yahoo.con", "yahoo.com"),
    ("yahoo.co", "yahoo.com"),
    ("outlok.com", "outlook.com"),
    ("outloo.com", "outlook.com"),
    ("outlook.con", "outlook.com"),
    ("iclod.com", "icloud.com"),
    ("icloud.con", "icloud.com"),
];

fn email_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}$").expect("email pattern")
    })
}

fn loose_email_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("loose email pattern"))
}

/// Cheap gate: only values with an `@` and more than five characters are
/// considered for repair.
pub fn is_email_candidate(value: &str) -> bool {
    value.contains('@') && value.chars().count() > 5
}

/// Classifier used by type inference: a well-formed address after trimming.
pub fn looks_like_email(value: &str) -> bool {
    loose_email_shape().is_match(value.trim())
}

fn collapse_runs(input: &str, ch: char) -> String {
    let mut out = String::with_capacity(input.len());
    for current in input.chars() {
        if current == ch && out.ends_with(ch) {
            continue;
        }
        out.push(current);
    }
    out
}

/// Normalizes an address and corrects well-known domain typos.
///
/// Returns the input untouched whenever the result would not be a valid
/// `local@domain.tld` address.
pub fn repair_email(value: &str) -> Cow<'_, str> {
    if !is_email_candidate(value) {
        return Cow::Borrowed(value);
    }
    let compact: String = value
        .to_lowercase()
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect();
    let mut repaired = collapse_runs(&compact, '.');

    if let Some((local, domain)) = repaired.split_once('@')
        && let Some((_, fixed)) = DOMAIN_TYPOS.iter().find(|(typo, _)| *typo == domain)
    {
        repaired = format!("{local}@{fixed}");
    }

    if !email_shape().is_match(&repaired) {
        return Cow::Borrowed(value);
    }
    if repaired == value {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(repaired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_fixes_domain_typos() {
        assert_eq!(repair_email("JOHN@GMIAL.COM").as_ref(), "john@gmail.com");
        assert_eq!(repair_email("ann@hotmail.con").as_ref(), "ann@hotmail.com");
    }

    #[test]
    fn removes_whitespace_and_repeated_separators() {
        assert_eq!(repair_email(" jane . doe @ example..com ").as_ref(), "jane.doe@example.com");
        assert_eq!(repair_email("bob@example,,com").as_ref(), "bob@example.com");
    }

    #[test]
    fn invalid_results_return_original() {
        assert_eq!(repair_email("not an @ address").as_ref(), "not an @ address");
        assert_eq!(repair_email("a@b@c.com").as_ref(), "a@b@c.com");
        assert!(matches!(repair_email("a@b.c"), Cow::Borrowed("a@b.c")));
    }

    #[test]
    fn only_exact_domain_matches_are_rewritten() {
        assert_eq!(repair_email("x@mygmial.com").as_ref(), "x@mygmial.com");
    }

    #[test]
    fn already_clean_is_borrowed() {
        assert!(matches!(repair_email("a.b@example.org"), Cow::Borrowed(_)));
    }

    #[test]
    fn classifier_accepts_only_address_shapes() {
        assert!(looks_like_email("someone@example.com"));
        assert!(!looks_like_email("someone at example.com"));
        assert!(!looks_like_email("@example.com"));
    }
}
