//! Plain-text tables for the `preview` command.

use std::{borrow::Cow, fmt::Write as _};

use crate::{ddl, inference::ColumnTypes};

/// Cells wider than this are cut and end in an ellipsis.
pub const MAX_CELL_WIDTH: usize = 40;
const COLUMN_GAP: &str = "  ";

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let headers: Vec<Cow<'_, str>> = headers.iter().map(|h| fit_cell(h)).collect();
    let rows: Vec<Vec<Cow<'_, str>>> = rows
        .iter()
        .map(|row| row.iter().take(headers.len()).map(|c| fit_cell(c)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| width_of(h).max(3)).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(width_of(cell));
        }
    }

    let mut output = String::new();
    push_line(&mut output, &headers, &widths);
    let rule: Vec<Cow<'_, str>> = widths.iter().map(|w| Cow::Owned("-".repeat(*w))).collect();
    push_line(&mut output, &rule, &widths);
    for row in &rows {
        push_line(&mut output, row, &widths);
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

/// One line per column: name, inferred tag and the SQL type it maps to.
pub fn render_column_types(types: &ColumnTypes) -> String {
    let headers = ["column", "type", "sql"].map(String::from).to_vec();
    let rows: Vec<Vec<String>> = types
        .iter()
        .map(|(name, ty)| {
            vec![
                name.to_string(),
                ty.tag().to_string(),
                ddl::storage_type(ty.tag()).to_string(),
            ]
        })
        .collect();
    render_table(&headers, &rows)
}

fn push_line(output: &mut String, cells: &[Cow<'_, str>], widths: &[usize]) {
    let mut line = String::new();
    for (idx, width) in widths.iter().enumerate() {
        if idx > 0 {
            line.push_str(COLUMN_GAP);
        }
        let cell = cells.get(idx).map(|c| c.as_ref()).unwrap_or("");
        let _ = write!(line, "{cell}");
        line.push_str(&" ".repeat(width.saturating_sub(width_of(cell))));
    }
    let _ = writeln!(output, "{}", line.trim_end());
}

fn width_of(value: &str) -> usize {
    value.chars().count()
}

/// Flattens line breaks and tabs, then truncates to [`MAX_CELL_WIDTH`].
fn fit_cell(value: &str) -> Cow<'_, str> {
    let flattened: Cow<'_, str> = if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    };
    if width_of(&flattened) <= MAX_CELL_WIDTH {
        return flattened;
    }
    let mut cut: String = flattened.chars().take(MAX_CELL_WIDTH - 1).collect();
    cut.push('…');
    Cow::Owned(cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::infer_column_types;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn aligns_columns_and_trims_trailing_space() {
        let rendered = render_table(
            &strings(&["id", "name"]),
            &[strings(&["1", "Ann"]), strings(&["10", "Bo"])],
        );
        assert_eq!(rendered, "id   name\n---  ----\n1    Ann\n10   Bo\n");
    }

    #[test]
    fn flattens_and_truncates_long_cells() {
        let long = "x".repeat(60);
        let rendered = render_table(
            &strings(&["note"]),
            &[vec!["a\nb".to_string()], vec![long]],
        );
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[2], "a b");
        assert!(!rendered.contains(&"x".repeat(41)));
        assert_eq!(lines[1].len(), MAX_CELL_WIDTH);
    }

    #[test]
    fn lists_inferred_types_with_sql() {
        let headers = strings(&["qty"]);
        let types = infer_column_types(&headers, &[strings(&["3"])]);
        let rendered = render_column_types(&types);
        assert!(rendered.lines().nth(2).unwrap().starts_with("qty"));
        assert!(rendered.contains("tinyint"));
        assert!(rendered.contains("TINYINT"));
    }
}
