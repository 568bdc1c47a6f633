//! End-to-end runs of the `uptodate` binary on offline fixtures.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::process::{Command, Output};

fn uptodate(args: &[&str], github_output: Option<&Path>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_uptodate"));
    let _ = command.args(args).env_remove("GITHUB_OUTPUT").env_remove("RUST_LOG");
    if let Some(path) = github_output {
        let _ = command.env("GITHUB_OUTPUT", path);
    }
    command.output().expect("run uptodate")
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = dir.path().join("app");
    std::fs::create_dir_all(&app).expect("mkdir");
    std::fs::write(
        app.join("uptodate.yaml"),
        "dockerbuild:\n  build_args:\n    py:\n      values: ['3.9', '3.10']\n",
    )
    .expect("write spec");
    std::fs::write(app.join("Dockerfile"), "ARG py\nFROM python:${py}\n").expect("write");
    std::fs::write(dir.path().join("Dockerfile"), "FROM scratch\nARG jobs=4\n").expect("write");
    dir
}

#[test]
fn dockerbuild_prints_manual_matrix() {
    let dir = fixture();
    let root = dir.path().join("app");
    let output = uptodate(&["dockerbuild", root.to_str().expect("utf8")], None);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let results: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let names: Vec<&str> = results
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["container_name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["app:py-3.9", "app:py-3.10"]);
    assert_eq!(results[0]["parser"], "dockerbuild");
}

#[test]
fn dockerfilelist_filters_empty_build_args() {
    let dir = fixture();
    let root = dir.path().to_str().expect("utf8");
    let output = uptodate(&["dockerfilelist", root, "--no-empty-build-args"], None);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let records = records.as_array().expect("array");
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0]["filename"],
        dir.path().join("Dockerfile").display().to_string()
    );
    assert_eq!(records[0]["parser"], "dockerfilelist");
}

#[test]
fn github_output_receives_matrix_lines() {
    let dir = fixture();
    let out = dir.path().join("github_output");
    let root = dir.path().to_str().expect("utf8");
    let output = uptodate(&["dockerfilelist", root, "--no-build-args"], Some(&out));
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());

    let written = std::fs::read_to_string(&out).expect("read output");
    assert_eq!(
        written,
        "dockerfilelist_matrix=[]\ndockerfilelist_matrix_empty=true\n"
    );
}

#[test]
fn dockerbases_missing_directory_fails() {
    let dir = fixture();
    let root = dir.path().to_str().expect("utf8");
    let missing = dir.path().join("nope");
    let output = uptodate(
        &["dockerbases", root, "--bases", missing.to_str().expect("utf8")],
        None,
    );
    assert!(!output.status.success());
}
