mod common;

use assert_cmd::Command;
use common::TestWorkspace;
use predicates::{prelude::PredicateBooleanExt, str::contains};

const MESSY_CSV: &str = "Name,Email,Phone\n john  doe ,JOHN@GMIAL.COM,555.123.4567\nAnn Lee,ann@example.com,N/A\nAnn Lee,ann@example.com,N/A\n";

fn csv_scrub() -> Command {
    Command::cargo_bin("csv-scrub").expect("binary exists")
}

#[test]
fn clean_writes_output_and_artifacts() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("contacts.csv", MESSY_CSV);
    let output = workspace.path().join("contacts_clean.csv");
    let sql = workspace.path().join("schema.sql");
    let summary = workspace.path().join("summary.json");
    let transcript = workspace.path().join("run.log");

    csv_scrub()
        .args(["clean", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--sql")
        .arg(&sql)
        .arg("--summary")
        .arg(&summary)
        .arg("--transcript")
        .arg(&transcript)
        .args(["--mode", "advanced", "--table", "contacts"])
        .assert()
        .success();

    assert_eq!(
        workspace.read("contacts_clean.csv"),
        "Name,Email,Phone\nJohn Doe,john@gmail.com,(555) 123-4567\nAnn Lee,ann@example.com,\n"
    );

    let sql_text = workspace.read("schema.sql");
    assert!(sql_text.contains("CREATE TABLE IF NOT EXISTS `contacts`"));
    assert!(sql_text.contains("`email` VARCHAR(255)"));
    assert!(sql_text.contains("LOAD DATA LOCAL INFILE 'contacts_clean.csv'"));

    let summary: serde_json::Value =
        serde_json::from_str(&workspace.read("summary.json")).expect("summary json");
    assert_eq!(summary["stats"]["original_rows"], 3);
    assert_eq!(summary["stats"]["cleaned_rows"], 2);
    assert_eq!(summary["stats"]["exact_duplicates"], 1);
    assert_eq!(summary["column_types"]["Email"], "email");

    let log = workspace.read("run.log");
    assert!(log.contains("[success] Kept 2 of 3 row(s)"));
}

#[test]
fn clean_reads_yaml_config() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("people.csv", "id,name\n9,ann\n4,bob\n");
    let config = workspace.write(
        "clean.yml",
        "mode: advanced\ngenerate_id: true\nline_ending: crlf\ntable_name: people\n",
    );
    let output = workspace.path().join("people_clean.csv");

    csv_scrub()
        .args(["clean", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert_eq!(
        workspace.read("people_clean.csv"),
        "id,name\r\n1,Ann\r\n2,Bob\r\n"
    );
}

#[test]
fn unknown_config_key_is_rejected() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("data.csv", "a\n1\n");
    let config = workspace.write("bad.yml", "remove_dupes: true\n");

    csv_scrub()
        .args(["clean", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(workspace.path().join("out.csv"))
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains("error: Parsing config file"));
}

#[test]
fn unknown_encoding_is_rejected() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("data.csv", "a\n1\n");

    csv_scrub()
        .args(["clean", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(workspace.path().join("out.csv"))
        .args(["--input-encoding", "klingon-8"])
        .assert()
        .failure()
        .stderr(contains("Unknown encoding 'klingon-8'"));
}

#[test]
fn missing_input_reports_path() {
    let workspace = TestWorkspace::new();

    csv_scrub()
        .args(["clean", "-i"])
        .arg(workspace.path().join("absent.csv"))
        .arg("-o")
        .arg(workspace.path().join("out.csv"))
        .assert()
        .failure()
        .stderr(contains("Opening input file"));
}

#[test]
fn decodes_declared_input_encoding() {
    let workspace = TestWorkspace::new();
    let input = workspace.path().join("latin.csv");
    std::fs::write(&input, b"city\nS\xe3o Paulo\n").expect("write latin-1 file");
    let output = workspace.path().join("latin_clean.csv");

    csv_scrub()
        .args(["clean", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--input-encoding", "latin1"])
        .assert()
        .success();

    assert_eq!(workspace.read("latin_clean.csv"), "city\nSão Paulo\n");
}

#[test]
fn preview_prints_rows_and_types() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", "order,amount\nA-1,1.50\nA-2,2.25\nA-3,9.00\n");

    csv_scrub()
        .args(["preview", "-i"])
        .arg(&input)
        .args(["--rows", "2"])
        .assert()
        .success()
        .stdout(contains("order  amount"))
        .stdout(contains("A-2    2.25"))
        .stdout(contains("A-3").not())
        .stdout(contains("decimal_money  DECIMAL(15,2)"));
}
