use std::{borrow::Cow, sync::OnceLock};

use regex::Regex;

/// Case policy attached to a column by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseRule {
    Lower,
    Title,
    Keep,
}

fn lower_case_columns() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)e[-_]?mail|url|website|web_site|link").expect("lower-case column pattern")
    })
}

fn title_case_columns() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)name|address|city|country|state|street|town|province|region")
            .expect("title-case column pattern")
    })
}

fn html_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[A-Za-z/!][^<>]*>").expect("html tag pattern"))
}

const HTML_ENTITIES: [(&str, &str); 6] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#039;", "'"),
    ("&amp;", "&"),
];

pub fn case_rule_for(column: &str) -> CaseRule {
    if lower_case_columns().is_match(column) {
        CaseRule::Lower
    } else if title_case_columns().is_match(column) {
        CaseRule::Title
    } else {
        CaseRule::Keep
    }
}

/// Returns a lowercase representation, reusing the original string if already lowercase.
pub fn lowercase(input: &str) -> Cow<'_, str> {
    if input.chars().all(|ch| !ch.is_uppercase()) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.to_lowercase())
    }
}

/// Upper-cases the first letter of every whitespace-separated word and
/// lower-cases the rest. Whitespace runs are kept exactly as they were.
pub fn title_case(input: &str) -> Cow<'_, str> {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for ch in input.chars() {
        if ch.is_whitespace() {
            out.push(ch);
            at_word_start = true;
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    if out == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(out)
    }
}

pub fn normalize_case(input: &str, rule: CaseRule) -> Cow<'_, str> {
    match rule {
        CaseRule::Lower => lowercase(input),
        CaseRule::Title => title_case(input),
        CaseRule::Keep => Cow::Borrowed(input),
    }
}

/// Trims and folds every internal whitespace run to a single space.
pub fn collapse_whitespace(input: &str) -> Cow<'_, str> {
    let trimmed = input.trim();
    let mut previous_space = false;
    let needs_fold = trimmed.chars().any(|ch| {
        let fold = ch.is_whitespace() && (ch != ' ' || previous_space);
        previous_space = ch.is_whitespace();
        fold
    });
    if !needs_fold {
        return Cow::Borrowed(trimmed);
    }
    let mut out = String::with_capacity(trimmed.len());
    for word in trimmed.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    Cow::Owned(out)
}

pub fn looks_like_html(input: &str) -> bool {
    html_tag().is_match(input) || HTML_ENTITIES.iter().any(|(entity, _)| input.contains(entity))
}

/// Removes tag spans and decodes the handful of common named entities.
pub fn strip_html(input: &str) -> Cow<'_, str> {
    if !looks_like_html(input) {
        return Cow::Borrowed(input);
    }
    let mut text = html_tag().replace_all(input, "").into_owned();
    for (entity, replacement) in HTML_ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }
    Cow::Owned(text.trim().to_string())
}

/// Drops ASCII control characters except tab, newline and carriage return.
pub fn strip_control_chars(input: &str) -> Cow<'_, str> {
    let is_stripped = |ch: char| ch.is_ascii_control() && !matches!(ch, '\t' | '\n' | '\r');
    if !input.chars().any(is_stripped) {
        return Cow::Borrowed(input);
    }
    Cow::Owned(input.chars().filter(|ch| !is_stripped(*ch)).collect())
}
