#![allow(non_snake_case)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::json;
use tempfile::{tempdir, TempDir};

const BASELINE: &str = r#"
[baseline]
tarpaulin_line = 80.00
llvm_line = 75.00

[threshold]
max_drop = 2.00
"#;

fn workspace() -> TempDir {
    let dir = tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("target/coverage")).expect("coverage dir");
    dir
}

fn write_baseline(root: &Path, text: &str) {
    fs::write(root.join("coverage_baseline.toml"), text).expect("baseline");
}

fn write_tarpaulin(root: &Path, coverage: f64) {
    let report = json!({ "files": [], "covered": 0, "coverable": 0, "coverage": coverage });
    fs::write(
        root.join("target/coverage/tarpaulin-report.json"),
        serde_json::to_vec(&report).expect("bytes"),
    )
    .expect("tarpaulin report");
}

fn write_llvm(root: &Path, percent: f64) {
    let summary = json!({
        "type": "llvm.coverage.json.export",
        "version": "2.0.1",
        "data": [{ "totals": { "lines": { "count": 100, "covered": 74, "percent": percent } } }]
    });
    fs::write(
        root.join("target/coverage/llvm-summary.json"),
        serde_json::to_vec(&summary).expect("bytes"),
    )
    .expect("llvm summary");
}

/// Runs the binary with a clean environment for every variable the gate reads.
fn gate(root: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_coverage_gate"));
    command
        .arg("--root")
        .arg(root)
        .env_remove("COVERAGE_OPTIONAL_TARPAULIN")
        .env_remove("COVERAGE_GATE_ROOT")
        .env_remove("COVERAGE_TARPAULIN_REPORT")
        .env_remove("COVERAGE_LLVM_SUMMARY")
        .env_remove("COVERAGE_BASELINE")
        .env_remove("RUST_LOG");
    command
}

fn run(command: &mut Command) -> (Option<i32>, String, String) {
    let Output {
        status,
        stdout,
        stderr,
    } = command.output().expect("run coverage_gate");
    (
        status.code(),
        String::from_utf8(stdout).expect("utf8 stdout"),
        String::from_utf8(stderr).expect("utf8 stderr"),
    )
}

#[test]
fn coverage_gate_binary__within_tolerance__then_exits_zero_with_summary() {
    let dir = workspace();
    write_baseline(dir.path(), BASELINE);
    write_tarpaulin(dir.path(), 79.5);
    write_llvm(dir.path(), 74.0);

    let (code, stdout, stderr) = run(&mut gate(dir.path()));

    assert_eq!(code, Some(0), "stderr: {stderr}");
    assert_eq!(
        stdout.trim_end(),
        "Coverage OK | Tarpaulin: 79.50% (baseline 80.00%, floor 78.00%) | \
         LLVM: 74.00% (baseline 75.00%, floor 73.00%)"
    );
    assert!(stderr.is_empty());
}

#[test]
fn coverage_gate_binary__tarpaulin_regression__then_exits_one_with_prefixed_line() {
    let dir = workspace();
    write_baseline(dir.path(), BASELINE);
    write_tarpaulin(dir.path(), 77.0);
    write_llvm(dir.path(), 74.0);

    let (code, stdout, stderr) = run(&mut gate(dir.path()));

    assert_eq!(code, Some(1));
    assert!(stdout.is_empty());
    assert_eq!(
        stderr.trim_end(),
        "Coverage regression: Tarpaulin coverage 77.00% (Δ -3.00%) below floor 78.00%"
    );
}

#[test]
fn coverage_gate_binary__both_regress__then_violations_joined() {
    let dir = workspace();
    write_baseline(dir.path(), BASELINE);
    write_tarpaulin(dir.path(), 70.0);
    write_llvm(dir.path(), 60.0);

    let (code, _, stderr) = run(&mut gate(dir.path()));

    assert_eq!(code, Some(1));
    assert_eq!(stderr.lines().count(), 1);
    assert!(stderr.contains(
        "Tarpaulin coverage 70.00% (Δ -10.00%) below floor 78.00%; LLVM coverage 60.00%"
    ));
}

#[test]
fn coverage_gate_binary__missing_llvm_with_optional_env__then_fails() {
    let dir = workspace();
    write_baseline(dir.path(), BASELINE);
    write_tarpaulin(dir.path(), 79.5);

    let (code, _, stderr) = run(gate(dir.path()).env("COVERAGE_OPTIONAL_TARPAULIN", "1"));

    assert_eq!(code, Some(1));
    assert!(stderr.starts_with("Coverage regression: LLVM summary missing:"));
}

#[test]
fn coverage_gate_binary__missing_tarpaulin_with_optional_env__then_skipped() {
    let dir = workspace();
    write_baseline(dir.path(), BASELINE);
    write_llvm(dir.path(), 74.0);

    let (code, stdout, stderr) = run(gate(dir.path()).env("COVERAGE_OPTIONAL_TARPAULIN", "1"));

    assert_eq!(code, Some(0), "stderr: {stderr}");
    assert!(stdout.starts_with("Tarpaulin skipped: optional flag set, baseline substituted\n"));
    assert!(stdout.contains("floor 78.00%, skipped)"));
    assert!(stderr.is_empty(), "stderr: {stderr}");
}

#[test]
fn coverage_gate_binary__failing_tarpaulin_with_optional_env__then_exits_zero() {
    let dir = workspace();
    write_baseline(dir.path(), BASELINE);
    write_tarpaulin(dir.path(), 10.0);
    write_llvm(dir.path(), 74.0);

    let (code, stdout, stderr) = run(gate(dir.path()).env("COVERAGE_OPTIONAL_TARPAULIN", "1"));

    assert_eq!(code, Some(0), "stderr: {stderr}");
    assert!(stdout.contains("Tarpaulin: 80.00% (baseline 80.00%, floor 78.00%, skipped)"));
    assert!(stderr.is_empty(), "stderr: {stderr}");

    fs::write(dir.path().join("target/coverage/tarpaulin-report.json"), "{ not json")
        .expect("garbage report");
    let (code, _, stderr) = run(gate(dir.path()).env("COVERAGE_OPTIONAL_TARPAULIN", "1"));
    assert_eq!(code, Some(0), "stderr: {stderr}");
}

#[test]
fn coverage_gate_binary__optional_env_not_one__then_missing_tarpaulin_fails() {
    let dir = workspace();
    write_baseline(dir.path(), BASELINE);
    write_llvm(dir.path(), 74.0);

    let (code, _, stderr) = run(gate(dir.path()).env("COVERAGE_OPTIONAL_TARPAULIN", "true"));

    assert_eq!(code, Some(1));
    assert!(stderr.starts_with("Coverage regression: Tarpaulin report missing:"));
}

#[test]
fn coverage_gate_binary__baseline_missing_max_drop__then_fails_first() {
    let dir = workspace();
    write_baseline(
        dir.path(),
        "[baseline]\ntarpaulin_line = 80.0\nllvm_line = 75.0\n",
    );

    let (code, _, stderr) = run(&mut gate(dir.path()));

    assert_eq!(code, Some(1));
    assert!(stderr.starts_with("Coverage regression: Invalid baseline configuration ("));
}

#[test]
fn coverage_gate_binary__explicit_paths__then_used_instead_of_defaults() {
    let dir = workspace();
    let custom = dir.path().join("ci");
    fs::create_dir_all(&custom).expect("ci dir");
    fs::write(custom.join("baseline.toml"), BASELINE).expect("baseline");
    fs::write(custom.join("tarpaulin.json"), r#"{"coverage": 81.0}"#).expect("tarpaulin");
    fs::write(
        custom.join("llvm.json"),
        r#"{"data": [{"totals": {"lines": {"percent": 76.0}}}]}"#,
    )
    .expect("llvm");

    let (code, stdout, stderr) = run(gate(dir.path())
        .args(["--baseline", "ci/baseline.toml"])
        .args(["--tarpaulin-report", "ci/tarpaulin.json"])
        .env("COVERAGE_LLVM_SUMMARY", custom.join("llvm.json")));

    assert_eq!(code, Some(0), "stderr: {stderr}");
    assert!(stdout.contains("Tarpaulin: 81.00%"));
    assert!(stdout.contains("LLVM: 76.00%"));
}

#[test]
fn coverage_gate_binary__json_format_regression__then_report_and_exit_one() {
    let dir = workspace();
    write_baseline(dir.path(), BASELINE);
    write_tarpaulin(dir.path(), 79.5);
    write_llvm(dir.path(), 72.0);

    let (code, stdout, stderr) = run(gate(dir.path()).args(["--format", "json"]));

    assert_eq!(code, Some(1));
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("json report");
    assert_eq!(report["status"], "regression");
    assert_eq!(report["llvm"]["floor"], 73.0);
    assert_eq!(
        report["violations"][0],
        "LLVM coverage 72.00% (Δ -3.00%) below floor 73.00%"
    );
    assert!(stderr.starts_with("Coverage regression: LLVM coverage 72.00%"));
}
