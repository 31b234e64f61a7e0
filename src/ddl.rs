//! CREATE TABLE and bulk-load statement generation (MySQL dialect).

use itertools::Itertools;

use crate::{
    columns::{dedupe_headers, sanitize_column_name},
    config::LineEnding,
    inference::ColumnTypes,
};

/// Maps an inferred type tag to its column type. Unknown tags become `TEXT`.
pub fn storage_type(tag: &str) -> &'static str {
    match tag {
        "tinyint" => "TINYINT",
        "smallint" => "SMALLINT",
        "int" => "INT",
        "bigint" => "BIGINT",
        "decimal_money" => "DECIMAL(15,2)",
        "decimal" => "DECIMAL(20,6)",
        "boolean" => "BOOLEAN",
        "date" => "DATE",
        "email" | "varchar" => "VARCHAR(255)",
        "varchar_long" => "VARCHAR(1000)",
        "text" => "TEXT",
        "longtext" => "LONGTEXT",
        _ => "TEXT",
    }
}

fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn escaped_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        b'\'' => "\\'".to_string(),
        b'\\' => "\\\\".to_string(),
        other => (other as char).to_string(),
    }
}

/// Headers as SQL identifiers: sanitized, then made unique.
pub fn sql_identifiers(headers: &[String]) -> Vec<String> {
    dedupe_headers(headers.iter().map(|h| sanitize_column_name(h)).collect())
}

pub fn create_table_statement(
    table_name: &str,
    headers: &[String],
    types: &ColumnTypes,
    primary_key: &str,
) -> String {
    let table = sanitize_column_name(table_name);
    let primary_key = sanitize_column_name(primary_key);
    let identifiers = sql_identifiers(headers);
    let has_primary_key = identifiers
        .iter()
        .any(|name| name.eq_ignore_ascii_case(&primary_key));

    let mut definitions = Vec::with_capacity(identifiers.len() + 1);
    if !has_primary_key {
        definitions.push(format!(
            "{} INT AUTO_INCREMENT PRIMARY KEY",
            quote_identifier(&primary_key)
        ));
    }
    for (header, identifier) in headers.iter().zip(&identifiers) {
        let tag = types.get(header).map(|ty| ty.tag()).unwrap_or("unknown");
        definitions.push(format!(
            "{} {}",
            quote_identifier(identifier),
            storage_type(tag)
        ));
    }
    if has_primary_key {
        definitions.push(format!("PRIMARY KEY ({})", quote_identifier(&primary_key)));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n);\n",
        quote_identifier(&table),
        definitions.iter().join(",\n  ")
    )
}

pub fn bulk_load_statement(
    file_name: &str,
    table_name: &str,
    headers: &[String],
    delimiter: u8,
    line_ending: LineEnding,
) -> String {
    let columns = sql_identifiers(headers)
        .iter()
        .map(|name| quote_identifier(name))
        .join(", ");
    format!(
        "LOAD DATA LOCAL INFILE {}\nINTO TABLE {}\nFIELDS TERMINATED BY '{}' OPTIONALLY ENCLOSED BY '\"'\nLINES TERMINATED BY '{}'\nIGNORE 1 LINES\n({});\n",
        quote_literal(file_name),
        quote_identifier(&sanitize_column_name(table_name)),
        escaped_delimiter(delimiter),
        line_ending.escaped(),
        columns
    )
}
