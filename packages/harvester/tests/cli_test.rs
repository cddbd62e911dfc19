//! Command-line tests.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn harvester() -> Command {
    let mut cmd: Command = cargo_bin_cmd!("iao-harvester").into();
    cmd.env("NO_COLOR", "1")
        .env_remove("IAO_MAPPING")
        .env_remove("IAO_TERM_IDS")
        .env_remove("IAO_DAG")
        .env_remove("RUST_LOG");
    cmd
}

fn with_resources(cmd: &mut Command) -> &mut Command {
    cmd.arg("--mapping")
        .arg(fixture("mapping.txt"))
        .arg("--term-ids")
        .arg(fixture("term_ids.txt"))
        .arg("--dag")
        .arg(fixture("dag.graphml"))
}

#[test]
fn test_process_writes_outputs() {
    let out = TempDir::new().unwrap();
    let mut cmd = harvester();
    cmd.arg("process")
        .arg(fixture("PMC0001.html"))
        .arg("--config")
        .arg(fixture("html_config.json"))
        .arg("--output")
        .arg(out.path());
    with_resources(&mut cmd)
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed"));

    let bioc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("PMC0001_bioc.json")).unwrap())
            .unwrap();
    assert_eq!(bioc["documents"][0]["id"], "PMC0001");
    assert_eq!(bioc["date"].as_str().unwrap().len(), 8);
    assert!(out.path().join("PMC0001_tables.json").exists());
}

#[test]
fn test_process_directory_uses_env_resources() {
    let out = TempDir::new().unwrap();
    harvester()
        .arg("process")
        .arg(fixture(""))
        .arg("--pattern")
        .arg(r"(?i).*\.(html|xml)$")
        .arg("--config")
        .arg(fixture("html_config.json"))
        .arg("--output")
        .arg(out.path())
        .env("IAO_MAPPING", fixture("mapping.txt"))
        .env("IAO_TERM_IDS", fixture("term_ids.txt"))
        .env("IAO_DAG", fixture("dag.graphml"))
        .assert()
        .success();

    assert!(out.path().join("PMC0001_bioc.json").exists());
    assert!(out.path().join("PMC0002_bioc.json").exists());
}

#[test]
fn test_process_missing_output_dir() {
    let out = TempDir::new().unwrap();
    let mut cmd = harvester();
    cmd.arg("process")
        .arg(fixture("PMC0001.html"))
        .arg("--config")
        .arg(fixture("html_config.json"))
        .arg("--output")
        .arg(out.path().join("missing"));
    with_resources(&mut cmd)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_process_invalid_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"title": {"defined-by": [{"tag": 7}]}}"#).unwrap();

    let mut cmd = harvester();
    cmd.arg("process")
        .arg(fixture("PMC0001.html"))
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(dir.path());
    with_resources(&mut cmd)
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a string or list of strings"));
}

#[test]
fn test_resolve_prints_inferred_headings() {
    let dir = TempDir::new().unwrap();
    let headings = dir.path().join("headings.txt");
    fs::write(&headings, "Introduction\nPatients\nMethods\nResults\nLimitations\n").unwrap();

    let mut cmd = harvester();
    cmd.arg("resolve").arg(&headings);
    with_resources(&mut cmd)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Patients\""))
        .stdout(predicate::str::contains("\"Limitations\""))
        .stdout(predicate::str::contains("\"Methods\"").not());
}

#[test]
fn test_missing_resources_fail() {
    harvester()
        .arg("resolve")
        .arg(fixture("mapping.txt"))
        .assert()
        .failure();
}
