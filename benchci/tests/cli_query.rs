//! CLI tests for the `benchci` query, facets, and chart commands.
//!
//! Spawns the binary against a database written to a temp directory and
//! checks stdout and exit codes.

use std::path::Path;
use std::process::{Command, Output};

use benchci::core::record::{EvaluationRecord, Scalar};
use benchci::io::database::save_database;
use benchci::test_support::{sample_records, scored};

fn benchci(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_benchci"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run benchci")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_default_database(dir: &Path, records: &[EvaluationRecord]) {
    save_database(&dir.join("reports/database.json"), records).expect("write database");
}

#[test]
fn query_prints_summary_and_sorted_rows() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_default_database(temp.path(), &sample_records());

    let output = benchci(
        temp.path(),
        &["query", "--model", "openai/gpt-4o", "--sort", "score"],
    );
    assert!(output.status.success());
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Showing 3 of 6 results");
    let scores: Vec<&str> = lines[4..]
        .iter()
        .map(|line| line.split_whitespace().nth(4).expect("score column"))
        .collect();
    assert_eq!(scores, vec!["0.4800", "0.8000", "0.8200"]);
}

#[test]
fn query_json_applies_search_case_insensitively() {
    let temp = tempfile::tempdir().expect("tempdir");
    let records = vec![
        scored("x", "Math", Scalar::Number(0.1)),
        scored("y", "reading", Scalar::Number(0.2)),
        scored("z", "gpqa", Scalar::Number(0.3)),
    ];
    write_default_database(temp.path(), &records);

    let output = benchci(
        temp.path(),
        &["query", "--search", "MA", "--format", "json"],
    );
    assert!(output.status.success());
    let view: Vec<EvaluationRecord> = serde_json::from_str(&stdout(&output)).expect("json view");
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].eval_name, "Math");
}

#[test]
fn missing_database_shows_zero_records() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = benchci(temp.path(), &["query"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("Showing 0 of 0 results"));
}

#[test]
fn invalid_config_exits_with_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::write(temp.path().join("benchci.toml"), "[output]\nlogs = \"\"\n").expect("config");
    let output = benchci(temp.path(), &["query"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("output.logs"));
}

#[test]
fn facets_list_models_then_evals() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_default_database(temp.path(), &sample_records());

    let output = benchci(temp.path(), &["facets"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "model: openai/gpt-4o\nmodel: anthropic/claude-sonnet\neval: mmlu\neval: gpqa\neval: humaneval\n"
    );
}

#[test]
fn chart_prints_chart_js_data() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_default_database(temp.path(), &sample_records());

    let output = benchci(temp.path(), &["chart", "--kind", "bar"]);
    assert!(output.status.success());
    let chart: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("chart json");
    assert_eq!(chart["labels"][0], "anthropic/claude-sonnet");
    assert_eq!(chart["datasets"].as_array().map(Vec::len), Some(3));
}

#[test]
fn chart_html_writes_spider_page() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_default_database(temp.path(), &sample_records());

    let output = benchci(
        temp.path(),
        &["chart", "--kind", "spider", "--format", "html"],
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("spider_chart.html"));
    let page = std::fs::read_to_string(temp.path().join("reports/spider_chart.html"))
        .expect("spider page");
    assert!(page.contains(r#"["gpqa","humaneval","mmlu"]"#));
    assert!(page.contains(r#""label":"openai/gpt-4o""#));
}
