//! End-to-end tests for the `plx` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use plx_core::pdf::builder::PdfBuilder;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const TEMPLATE: &str = r#"{
    "vendor": "ACME",
    "fields": [
        {"field": "po", "bbox": {"x0": 60, "y0": 710, "x1": 200, "y1": 690, "page": 0}, "type": "text"}
    ]
}"#;

/// Writes a sample PDF, a template and an empty config into `dir`.
fn fixtures(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let pdf = dir.join("order.pdf");
    let bytes = PdfBuilder::new()
        .page(595, 842)
        .text(72, 700, "PO 4411")
        .build()
        .unwrap();
    fs::write(&pdf, bytes).unwrap();

    let template = dir.join("template.json");
    fs::write(&template, TEMPLATE).unwrap();

    let config = dir.join("config.json");
    fs::write(&config, "{}").unwrap();

    (pdf, template, config)
}

fn plx() -> Command {
    Command::cargo_bin("plx").unwrap()
}

#[test]
fn test_help_lists_commands() {
    plx()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_extract_to_json() {
    let dir = TempDir::new().unwrap();
    let (pdf, template, config) = fixtures(dir.path());

    let output = plx()
        .arg("extract")
        .arg(&pdf)
        .arg("-t")
        .arg(&template)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["data"]["po"], "PO 4411");
}

#[test]
fn test_extract_to_csv_file() {
    let dir = TempDir::new().unwrap();
    let (pdf, template, config) = fixtures(dir.path());
    let out = dir.path().join("out.csv");

    plx()
        .arg("extract")
        .arg(&pdf)
        .args(["-f", "csv", "-t"])
        .arg(&template)
        .arg("-o")
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&out).unwrap(), "po\nPO 4411\n");
}

#[test]
fn test_extract_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let (_, template, config) = fixtures(dir.path());

    plx()
        .arg("extract")
        .arg(dir.path().join("missing.pdf"))
        .arg("-t")
        .arg(&template)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_batch_writes_outputs_and_summary() {
    let dir = TempDir::new().unwrap();
    let (pdf, template, config) = fixtures(dir.path());
    fs::copy(&pdf, dir.path().join("second.pdf")).unwrap();
    let out_dir = dir.path().join("out");

    plx()
        .arg("batch")
        .arg(format!("{}/*.pdf", dir.path().display()))
        .arg("-t")
        .arg(&template)
        .arg("-d")
        .arg(&out_dir)
        .arg("--summary")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    assert!(out_dir.join("order.json").exists());
    assert!(out_dir.join("second.json").exists());
    let summary = fs::read_to_string(out_dir.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,records,processing_time_ms,error\n"));
    assert_eq!(summary.matches(",success,1,").count(), 2);
}

#[test]
fn test_config_path_uses_given_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("plx.json");

    plx()
        .args(["config", "path", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("plx.json"))
        .stdout(predicate::str::contains("plx config init"));
}

#[test]
fn test_config_init_then_set() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("plx.json");

    plx()
        .args(["config", "init", "--config"])
        .arg(&config)
        .assert()
        .success();
    assert!(config.exists());

    plx()
        .args(["config", "set", "limits.maxPages", "5", "--config"])
        .arg(&config)
        .assert()
        .success();

    plx()
        .args(["config", "get", "limits.maxPages", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("5"));

    plx()
        .args(["config", "set", "limits.bogus", "1", "--config"])
        .arg(&config)
        .assert()
        .failure();
}
