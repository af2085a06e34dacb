//! CLI integration tests
//!
//! Runs the `officekit` binary with assert_cmd against files built in temp dirs.

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use officekit::docx::DocxDocument;
use predicates::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

const STAFF_YAML: &str = r#"
sheets:
  - name: Staff
    hidden_columns: [2]
    rows:
      - [Name, Age, Code]
      - [Ann, 31, a-1]
      - [Bob, 28.5, b-2]
  - rows:
      - [Key]
      - [second sheet]
"#;

fn officekit() -> Command {
    Command::cargo_bin("officekit").unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    officekit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("officekit"))
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_cli_unknown_command() {
    officekit().arg("calculate").assert().failure();
}

// ═══════════════════════════════════════════════════════════════════════════
// DATES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_dates_daily() {
    officekit()
        .args(["dates", "2024-02-28", "2024-03-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-02-28\n2024-02-29\n2024-03-01"));
}

#[test]
fn test_dates_monthly() {
    officekit()
        .args(["dates", "2023-12", "2024-01", "--monthly"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2023-12\n2024-01"));
}

#[test]
fn test_dates_bad_input_fails() {
    officekit()
        .args(["dates", "yesterday", "2024-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DateParse"));
}

// ═══════════════════════════════════════════════════════════════════════════
// EXPORT / IMPORT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_export_then_import_json() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("staff.yaml");
    let xlsx = dir.path().join("staff.xlsx");
    let json = dir.path().join("staff.json");
    fs::write(&data, STAFF_YAML).unwrap();

    officekit()
        .arg("export")
        .arg(&data)
        .arg("-o")
        .arg(&xlsx)
        .assert()
        .success()
        .stdout(predicate::str::contains("Export Complete"));

    officekit()
        .arg("import")
        .arg(&xlsx)
        .arg("-o")
        .arg(&json)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rows:"));

    let rows: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["Name"], "Ann");
    assert_eq!(rows[0]["Age"], "31");
    assert_eq!(rows[1]["Age"], "28.5");
    assert_eq!(rows[1]["Code"], "b-2");
}

#[test]
fn test_import_second_sheet_to_stdout() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("staff.yaml");
    let xlsx = dir.path().join("staff.xlsx");
    fs::write(&data, STAFF_YAML).unwrap();

    officekit()
        .arg("export")
        .arg(&data)
        .arg("-o")
        .arg(&xlsx)
        .arg("--no-autosize")
        .assert()
        .success();

    let assert = officekit()
        .arg("import")
        .arg(&xlsx)
        .args(["--sheets", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Excel Import"));

    let rows: Vec<BTreeMap<String, String>> =
        serde_yaml::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Key"], "second sheet");
}

#[test]
fn test_import_missing_file_fails() {
    officekit()
        .args(["import", "does-not-exist.xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.xlsx"));
}

#[test]
fn test_export_without_sheets_fails() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("empty.yaml");
    fs::write(&data, "sheets: []\n").unwrap();

    officekit()
        .arg("export")
        .arg(&data)
        .arg("-o")
        .arg(dir.path().join("out.xlsx"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("declares no sheets"));
}

// ═══════════════════════════════════════════════════════════════════════════
// DOCX TEMPLATES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_placeholders_and_fill() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("letter.docx");
    let values = dir.path().join("values.yaml");
    let output = dir.path().join("out.docx");

    let mut doc = DocxDocument::new();
    doc.add_paragraph(&["Dear $", "{customer}", ","]);
    doc.append_paragraph("${items}");
    doc.append_paragraph("Total: ${total}");
    doc.save(&template).unwrap();

    fs::write(
        &values,
        "customer: Ann Lee\ntotal: 12.5\nitems:\n  table:\n    - [Item, Qty]\n    - [Pen, 2]\n",
    )
    .unwrap();

    officekit()
        .arg("placeholders")
        .arg(&template)
        .assert()
        .success()
        .stdout(predicate::str::contains("customer"))
        .stdout(predicate::str::contains("3 placeholder(s)"));

    officekit()
        .arg("fill")
        .arg(&template)
        .arg("-v")
        .arg(&values)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Template filled"));

    let filled = DocxDocument::open(&output).unwrap();
    assert_eq!(
        filled.paragraph_texts(),
        vec!["Dear Ann Lee,", "Item", "Qty", "Pen", "2", "", "Total: 12.5"]
    );
}

#[test]
fn test_fill_reports_missing_values() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("t.docx");
    let values = dir.path().join("v.yaml");
    let mut doc = DocxDocument::new();
    doc.append_paragraph("${known} ${unknown}");
    doc.save(&template).unwrap();
    fs::write(&values, "known: yes\n").unwrap();

    officekit()
        .arg("fill")
        .arg(&template)
        .arg("-v")
        .arg(&values)
        .arg("-o")
        .arg(dir.path().join("o.docx"))
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown has no value"));
}

#[test]
fn test_fill_rejects_bad_mapping() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("t.docx");
    let values = dir.path().join("v.yaml");
    DocxDocument::new().save(&template).unwrap();
    fs::write(&values, "logo:\n  picture: a.png\n").unwrap();

    officekit()
        .arg("fill")
        .arg(&template)
        .arg("-v")
        .arg(&values)
        .arg("-o")
        .arg(dir.path().join("o.docx"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("'image' or 'table'"));
}

#[test]
fn test_fill_rejects_out_of_range_image_size() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("t.docx");
    let values = dir.path().join("v.yaml");
    let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    fs::write(dir.path().join("logo.png"), png).unwrap();
    let mut doc = DocxDocument::new();
    doc.append_paragraph("${logo}");
    doc.save(&template).unwrap();

    for width in ["5000000000", "-5", "12.5"] {
        fs::write(
            &values,
            format!("logo:\n  image: logo.png\n  width: {}\n", width),
        )
        .unwrap();

        officekit()
            .arg("fill")
            .arg(&template)
            .arg("-v")
            .arg(&values)
            .arg("-o")
            .arg(dir.path().join("o.docx"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("whole number of points"));
    }
}
