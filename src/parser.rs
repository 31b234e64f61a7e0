//! Quote-aware tokenizer for a single logical line.
//!
//! The scanner has two states. Outside quotes a `"` opens a quoted run and the
//! delimiter ends the cell; inside quotes the delimiter is literal, `""` emits
//! one quote and a lone `"` closes the run. The caller reconciles the cell
//! count with the header width.

/// Splits `line` into trimmed cells.
pub fn parse_row(line: &str, delimiter: u8) -> Vec<String> {
    let delimiter = delimiter as char;
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == delimiter {
            cells.push(finish_cell(&current));
            current.clear();
        } else {
            current.push(ch);
        }
    }
    cells.push(finish_cell(&current));
    cells
}

fn finish_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    let unwrapped = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    unwrapped.to_string()
}

pub fn quote_count(line: &str) -> usize {
    line.bytes().filter(|b| *b == b'"').count()
}

/// True when `line` leaves a quoted field open.
pub fn has_unbalanced_quotes(line: &str) -> bool {
    quote_count(line) % 2 == 1
}
