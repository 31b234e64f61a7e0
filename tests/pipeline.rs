mod common;

use common::clean_str;
use csv_scrub::{
    ConfigFile,
    config::{LineEnding, ModeKind},
    inference::InferredType,
};
use proptest::prelude::*;

fn advanced() -> ConfigFile {
    ConfigFile {
        mode: ModeKind::Advanced,
        ..ConfigFile::default()
    }
}

fn output_records(text: &str, delimiter: u8) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());
    reader
        .records()
        .map(|record| {
            record
                .expect("output parses as csv")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}

#[test]
fn round_trip_repairs_email_and_keeps_name() {
    let cleaned = clean_str("Name,Email\nJohn Doe,JOHN@GMIAL.COM\n", advanced());
    assert_eq!(cleaned.text(), "Name,Email\nJohn Doe,john@gmail.com\n");
}

#[test]
fn exact_duplicates_keep_first_occurrence() {
    let cleaned = clean_str("a,b\n1,x\n2,y\n1,x\n", ConfigFile::default());
    assert_eq!(cleaned.text(), "a,b\n1,x\n2,y\n");
    assert_eq!(cleaned.result.stats.exact_duplicates, 1);
    assert_eq!(cleaned.result.stats.removed_rows, 1);
}

#[test]
fn exact_duplicates_ignore_source_id_values() {
    let cleaned = clean_str("id,name\n1,Ann\n2,Ann\n", ConfigFile::default());
    assert_eq!(cleaned.text(), "id,name\n1,Ann\n");
}

#[test]
fn fuzzy_duplicates_collapse_case_and_spacing_variants() {
    let file = ConfigFile {
        fuzzy_dedup: true,
        ..ConfigFile::default()
    };
    let cleaned = clean_str("name,city\nJane Doe,Oslo\njane  doe,Oslo\n", file);
    assert_eq!(cleaned.text(), "name,city\nJane Doe,Oslo\n");
    assert_eq!(cleaned.result.stats.exact_duplicates, 0);
    assert_eq!(cleaned.result.stats.fuzzy_duplicates, 1);
}

#[test]
fn fuzzy_dedup_works_without_exact_dedup() {
    let file = ConfigFile {
        fuzzy_dedup: true,
        remove_duplicates: false,
        ..ConfigFile::default()
    };
    let cleaned = clean_str("name\nO'Brien\nobrien\nOBRIEN\n", file);
    assert_eq!(cleaned.text(), "name\nO'Brien\n");
    assert_eq!(cleaned.result.stats.fuzzy_duplicates, 2);
}

#[test]
fn generated_ids_are_sequential_without_gaps() {
    let file = ConfigFile {
        generate_id: true,
        ..ConfigFile::default()
    };
    let cleaned = clean_str("name,city\nAnn,Oslo\nBob,Rome\nAnn,Oslo\nCy,Nice\n", file);
    assert_eq!(cleaned.result.file_headers, vec!["id", "name", "city"]);
    assert_eq!(cleaned.result.raw_headers, vec!["name", "city"]);
    let ids: Vec<String> = cleaned.rows().into_iter().map(|row| row[0].clone()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[test]
fn generated_ids_replace_existing_id_column() {
    let file = ConfigFile {
        generate_id: true,
        ..ConfigFile::default()
    };
    let cleaned = clean_str("name,ID,city\nAnn,77,Oslo\nBob,12,Rome\n", file);
    assert_eq!(cleaned.text(), "id,name,city\n1,Ann,Oslo\n2,Bob,Rome\n");
    assert_eq!(cleaned.result.raw_headers, vec!["name", "ID", "city"]);
}

#[test]
fn phone_formatting_is_gated_by_column_name() {
    let cleaned = clean_str(
        "description,phone\n1234567,5551234567\n5559876543,555.987.6543\n",
        advanced(),
    );
    assert_eq!(
        cleaned.text(),
        "description,phone\n1234567,(555) 123-4567\n5559876543,(555) 987-6543\n"
    );
}

#[test]
fn multi_line_quoted_field_is_one_record() {
    let input = "id,comment,score\n1,\"first line\nsecond line\",5\n2,plain,6\n";
    let cleaned = clean_str(input, ConfigFile::default());
    assert_eq!(
        cleaned.text(),
        "id,comment,score\n1,first line second line,5\n2,plain,6\n"
    );
    let stats = &cleaned.result.stats;
    assert_eq!(stats.original_rows, 2);
    assert_eq!(stats.merged_records, 1);
    assert_eq!(stats.column_mismatches, 0);
}

#[test]
fn multi_line_field_keeps_newline_without_whitespace_folding() {
    let file = ConfigFile {
        trim_whitespace: false,
        ..ConfigFile::default()
    };
    let input = "id,comment\n1,\"first\nsecond\"\n";
    let cleaned = clean_str(input, file);
    assert_eq!(cleaned.text(), "id,comment\n1,\"first\nsecond\"\n");
}

#[test]
fn outliers_are_reported_by_column_name() {
    let mut input = String::from("amount\n");
    for value in [1, 2, 3, 4, 5, 6, 7, 8, 9, 1000] {
        input.push_str(&format!("{value}\n"));
    }
    let cleaned = clean_str(&input, advanced());
    let outliers = &cleaned.result.outliers;
    assert_eq!(outliers.len(), 1);
    assert_eq!(outliers[0].column, "amount");
    assert_eq!(outliers[0].count, 1);
}

#[test]
fn outliers_are_not_collected_in_standard_mode() {
    let mut input = String::from("amount\n");
    for value in [1, 2, 3, 4, 5, 6, 7, 8, 9, 1000] {
        input.push_str(&format!("{value}\n"));
    }
    let cleaned = clean_str(&input, ConfigFile::default());
    assert!(cleaned.result.outliers.is_empty());
}

#[test]
fn infers_types_and_generates_sql() {
    let cleaned = clean_str("qty,price\n1,1.50\n2,2.25\n3,1.50\n", ConfigFile::default());
    let types = &cleaned.result.column_types;
    assert_eq!(types.get("qty"), Some(InferredType::TinyInt));
    assert_eq!(types.get("price"), Some(InferredType::DecimalMoney));

    let create = &cleaned.result.create_table_sql;
    assert!(create.starts_with("CREATE TABLE IF NOT EXISTS `cleaned_data` ("));
    assert!(create.contains("`id` INT AUTO_INCREMENT PRIMARY KEY"));
    assert!(create.contains("`qty` TINYINT"));
    assert!(create.contains("`price` DECIMAL(15,2)"));
    assert!(cleaned.result.bulk_load_sql.contains("(`qty`, `price`)"));
}

#[test]
fn standard_mode_leaves_advanced_repairs_alone() {
    let cleaned = clean_str("Email,phone\nJOHN@GMIAL.COM,5551234567\n", ConfigFile::default());
    assert_eq!(cleaned.text(), "Email,phone\nJOHN@GMIAL.COM,5551234567\n");
}

#[test]
fn advanced_repairs_are_idempotent() {
    let input = "Name,Email,Phone,Joined,Amount,Notes\n john   doe ,JOHN@GMIAL.COM,555.123.4567,25/12/2023,\"$1,234.50\",<b>hi</b> &amp; bye\nAnn Lee,ann@example.com,N/A,2024-01-05,12,plain\n";
    let first = clean_str(input, advanced());
    assert_eq!(
        first.text(),
        "Name,Email,Phone,Joined,Amount,Notes\nJohn Doe,john@gmail.com,(555) 123-4567,2023-12-25,1234.50,hi & bye\nAnn Lee,ann@example.com,,2024-01-05,12,plain\n"
    );

    let second = clean_str(&first.text(), advanced());
    assert_eq!(second.text(), first.text());
    assert_eq!(second.result.stats.fixed, 0);
}

#[test]
fn detects_semicolon_and_tab_separators() {
    let cleaned = clean_str("a;b\n1;2\n", ConfigFile::default());
    assert_eq!(cleaned.text(), "a;b\n1;2\n");
    assert_eq!(cleaned.result.separator, b';');

    let cleaned = clean_str("a\tb\nx y\t2\n", ConfigFile::default());
    assert_eq!(cleaned.text(), "a\tb\nx y\t2\n");
}

#[test]
fn crlf_output_terminator() {
    let file = ConfigFile {
        line_ending: LineEnding::Crlf,
        ..ConfigFile::default()
    };
    let cleaned = clean_str("a,b\r\n1,2\r\n", file);
    assert_eq!(cleaned.text(), "a,b\r\n1,2\r\n");
    assert!(cleaned.result.bulk_load_sql.contains("LINES TERMINATED BY '\\r\\n'"));
}

#[test]
fn row_filters_drop_blank_and_incomplete_rows() {
    let cleaned = clean_str("a,b\n,\nnull,-\n1,\n2,3\n", ConfigFile::default());
    assert_eq!(cleaned.text(), "a,b\n1,\n2,3\n");
    assert_eq!(cleaned.result.stats.empty_rows_removed, 2);

    let file = ConfigFile {
        remove_rows_with_empty: true,
        ..ConfigFile::default()
    };
    let cleaned = clean_str("a,b\n1,\n2,3\n", file);
    assert_eq!(cleaned.text(), "a,b\n2,3\n");
    assert_eq!(cleaned.result.stats.rows_with_empty_removed, 1);
}

#[test]
fn sanitized_headers_are_unique_identifiers() {
    let file = ConfigFile {
        sanitize_headers: true,
        ..ConfigFile::default()
    };
    let cleaned = clean_str("\u{feff}First Name,first-name,Total $\nA,B,1\n", file);
    assert_eq!(
        cleaned.result.file_headers,
        vec!["first_name", "first_name_1", "total"]
    );
}

#[test]
fn small_windows_produce_identical_output() {
    let input = "city,note\nZürich,\"a, b\"\nSão Paulo,東京\nKøbenhavn,\"multi\nline\"\n";
    let whole = clean_str(input, ConfigFile::default());
    for chunk_size in [1, 2, 3, 5, 7] {
        let file = ConfigFile {
            chunk_size,
            ..ConfigFile::default()
        };
        let windowed = clean_str(input, file);
        assert_eq!(windowed.text(), whole.text(), "chunk size {chunk_size}");
    }
}

#[test]
fn repairs_mojibake_and_nulls() {
    let cleaned = clean_str("name,note\nJosÃ©,N/A\n", ConfigFile::default());
    assert_eq!(cleaned.text(), "name,note\nJosé,\n");
    assert_eq!(cleaned.result.stats.fixed, 2);
}

#[test]
fn summary_serializes_printable_separator() {
    let cleaned = clean_str("a\tb\n1\t2\n", ConfigFile::default());
    let json = serde_json::to_value(&cleaned.result).expect("serialize result");
    assert_eq!(json["separator"], "\\t");
    assert_eq!(json["stats"]["cleaned_rows"], 1);
    assert_eq!(json["column_types"]["a"], "tinyint");
}

proptest! {
    #[test]
    fn every_output_row_matches_file_headers(
        width in 1usize..5,
        lines in prop::collection::vec("[a-z0-9 ,\"]{0,16}", 0..25),
        generate_id in any::<bool>(),
    ) {
        let header = (0..width).map(|i| format!("c{i}")).collect::<Vec<_>>().join(",");
        let mut input = header;
        input.push('\n');
        for line in &lines {
            input.push_str(line);
            input.push('\n');
        }
        let file = ConfigFile { generate_id, ..ConfigFile::default() };
        let cleaned = clean_str(&input, file);
        let expected = cleaned.result.file_headers.len();
        prop_assert_eq!(expected, width + usize::from(generate_id));
        for record in output_records(&cleaned.text(), cleaned.result.separator) {
            prop_assert_eq!(record.len(), expected);
        }
    }
}
