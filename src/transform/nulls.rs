use std::borrow::Cow;

const NULL_TOKENS: &[&str] = &[
    "null",
    "n/a",
    "na",
    "none",
    "undefined",
    "nil",
    "?",
    "-",
    "\u{2014}",
    "#n/a",
    "#value!",
    "#ref!",
    "#div/0!",
    "#name?",
    "#null!",
    "#num!",
];

/// True for values that stand in for "no value".
pub fn is_null_token(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.len() >= 2 && trimmed.chars().all(|ch| ch == '.') {
        return true;
    }
    let lowered = trimmed.to_lowercase();
    NULL_TOKENS.contains(&lowered.as_str())
}

pub fn normalize_null(value: &str) -> Cow<'_, str> {
    if is_null_token(value) {
        Cow::Borrowed("")
    } else {
        Cow::Borrowed(value)
    }
}
