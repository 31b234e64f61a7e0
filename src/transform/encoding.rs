use std::borrow::Cow;

/// UTF-8 text that was decoded as Latin-1/Windows-1252 and re-encoded.
/// Three-character sequences come first so their prefixes never match early.
const MOJIBAKE: &[(&str, &str)] = &[
    ("â€™", "\u{2019}"),
    ("â€˜", "\u{2018}"),
    ("â€œ", "\u{201c}"),
    ("â€\u{9d}", "\u{201d}"),
    ("â€”", "\u{2014}"),
    ("â€“", "\u{2013}"),
    ("â€¦", "\u{2026}"),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ãª", "ê"),
    ("Ã«", "ë"),
    ("Ã¡", "á"),
    ("Ã\u{a0}", "à"),
    ("Ã¢", "â"),
    ("Ã¤", "ä"),
    ("Ã£", "ã"),
    ("Ã¥", "å"),
    ("Ã§", "ç"),
    ("Ã±", "ñ"),
    ("Ã³", "ó"),
    ("Ã²", "ò"),
    ("Ã´", "ô"),
    ("Ã¶", "ö"),
    ("Ãµ", "õ"),
    ("Ã¸", "ø"),
    ("Ãº", "ú"),
    ("Ã¹", "ù"),
    ("Ã»", "û"),
    ("Ã¼", "ü"),
    ("Ã\u{ad}", "í"),
    ("Ã¯", "ï"),
    ("Ã®", "î"),
    ("Ã‰", "É"),
    ("Ã‡", "Ç"),
    ("Ã–", "Ö"),
    ("Ãœ", "Ü"),
    ("Ã„", "Ä"),
    ("Ã…", "Å"),
    ("Ã‘", "Ñ"),
    ("ÃŸ", "ß"),
    ("Â\u{a0}", "\u{a0}"),
    ("Â°", "°"),
];

const BOM_ARTIFACT: &str = "ï»¿";
const BOM: char = '\u{feff}';

fn may_contain_mojibake(input: &str) -> bool {
    input.contains(['Ã', 'â', 'Â', 'ï', BOM])
}

/// Replaces known mis-decoded sequences with the characters they stand for.
pub fn repair_encoding(input: &str) -> Cow<'_, str> {
    if !may_contain_mojibake(input) {
        return Cow::Borrowed(input);
    }
    let mut text = input
        .trim_start_matches(BOM)
        .trim_start_matches(BOM_ARTIFACT)
        .to_string();
    for (broken, fixed) in MOJIBAKE {
        if text.contains(broken) {
            text = text.replace(broken, fixed);
        }
    }
    if text == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(text)
    }
}
