//! Test suite for the CLI entry point and exit-code contract.

use racescan::entry_point::run_with_args_to;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const RACY_UNIT: &str = r#"{
    "name": "main",
    "file": "demo.src",
    "body": [
        {"op": {"spawn": {"handle": "t", "body": [
            {"op": {"write": {"resource": "x"}}, "line": 15, "col": 5}
        ]}}, "line": 5, "col": 1},
        {"op": {"write": {"resource": "x"}}, "line": 10, "col": 1}
    ]
}"#;

const CLEAN_UNIT: &str = r#"{
    "name": "main",
    "body": [
        {"op": {"write": {"resource": "x"}}, "line": 1, "col": 1},
        {"op": {"spawn": {"handle": "t", "body": [
            {"op": {"read": {"resource": "x"}}, "line": 5, "col": 5}
        ]}}, "line": 2, "col": 1},
        {"op": {"join": {"handle": "t"}}, "line": 3, "col": 1}
    ]
}"#;

fn run(args: Vec<String>) -> (i32, String) {
    let mut buf = Vec::new();
    let code = run_with_args_to(args, &mut buf).unwrap();
    (code, String::from_utf8(buf).unwrap())
}

fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn racy_input_exits_one_and_reports() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "racy.json", RACY_UNIT);

    let (code, out) = run(vec![dir.path().display().to_string()]);
    assert_eq!(code, 1);
    assert!(out.contains("Race Candidates"));
    assert!(out.contains("demo.src:10:1"));
    assert!(out.contains("demo.src:15:5"));
}

#[test]
fn clean_input_exits_zero() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "clean.json", CLEAN_UNIT);

    let (code, out) = run(vec![dir.path().display().to_string()]);
    assert_eq!(code, 0);
    assert!(out.contains("No race candidates found"));
}

#[test]
fn malformed_input_exits_two_but_other_units_continue() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "bad.json", "{ this is not json");
    write_file(dir.path(), "racy.json", RACY_UNIT);

    let (code, out) = run(vec![dir.path().display().to_string()]);
    assert_eq!(code, 2, "blocking parse diagnostic wins over warnings");
    assert!(out.contains("parse-upstream"));
    assert!(out.contains("bad.json"));
    // The good unit was still analyzed.
    assert!(out.contains("demo.src:10:1"));
}

#[test]
fn json_output_is_machine_readable() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "racy.json", RACY_UNIT);

    let (code, out) = run(vec![dir.path().display().to_string(), "--json".to_owned()]);
    assert_eq!(code, 1);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["warnings"][0]["resource"], "x");
    assert_eq!(value["warnings"][0]["severity"], "error");
    assert_eq!(value["warnings"][0]["context_a"]["location"], "demo.src:10:1");
    assert_eq!(value["summary"]["total_units"], 1);
}

#[test]
fn config_can_suppress_resources() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "racy.json", RACY_UNIT);
    write_file(
        dir.path(),
        ".racescan.toml",
        "[racescan]\nignore_resources = [\"x\"]\n",
    );

    let (code, out) = run(vec![dir.path().display().to_string()]);
    assert_eq!(code, 0);
    assert!(out.contains("No race candidates found"));
}

#[test]
fn fail_on_diagnostics_flag_turns_diagnostics_into_failure() {
    let unit = r#"{
        "name": "main",
        "body": [
            {"op": {"unsupported": {"construct": "barrier"}}, "line": 1, "col": 1}
        ]
    }"#;
    let dir = tempdir().unwrap();
    write_file(dir.path(), "unit.json", unit);

    let (code, _) = run(vec![dir.path().display().to_string()]);
    assert_eq!(code, 0, "non-blocking diagnostics alone pass by default");

    let (code, out) = run(vec![
        dir.path().display().to_string(),
        "--fail-on-diagnostics".to_owned(),
    ]);
    assert_eq!(code, 1);
    assert!(out.contains("unsupported-construct"));
}

#[test]
fn help_flag_prints_usage_and_exits_zero() {
    let (code, out) = run(vec!["--help".to_owned()]);
    assert_eq!(code, 0);
    assert!(out.contains("Usage"));
    assert!(out.contains(".racescan.toml"));
}

#[test]
fn version_flag_exits_zero() {
    let (code, out) = run(vec!["--version".to_owned()]);
    assert_eq!(code, 0);
    assert!(out.contains("racescan"));
}

#[test]
fn output_flag_writes_report_to_file() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "racy.json", RACY_UNIT);
    let report = dir.path().join("report.json");

    let (code, out) = run(vec![
        dir.path().display().to_string(),
        "--json".to_owned(),
        "--output".to_owned(),
        report.display().to_string(),
    ]);
    assert_eq!(code, 1);
    assert!(out.is_empty(), "report went to the file, not the writer");
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["warnings"][0]["resource"], "x");
}
