//! Integration tests for the `cget` binary.
//!
//! Only commands that never reach the network are exercised here.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn cget(project: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cget"))
        .arg("--project")
        .arg(project)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("CGET_CACHE_DIR")
        .output()
        .expect("Failed to execute cget")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_init_then_list() {
    let dir = tempfile::tempdir().unwrap();

    let output = cget(dir.path(), &["init", "--name", "demo"]);
    assert!(
        output.status.success(),
        "init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(dir.path().join("cget.json").is_file());
    assert!(dir.path().join("extern").is_dir());

    let output = cget(dir.path(), &["list"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No dependencies"));
}

#[test]
fn test_list_shows_declared_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("cget.json"),
        r#"{
  "name": "demo",
  "version": "0.1.0",
  "dependencies": [
    { "name": "fmt", "source": "fmtlib/fmt", "version": ">=10" }
  ],
  "devDependencies": []
}"#,
    )
    .unwrap();

    let output = cget(dir.path(), &["list"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("fmtlib/fmt"));
    assert!(out.contains(">=10"));
}

#[test]
fn test_install_without_manifest_fails() {
    let dir = tempfile::tempdir().unwrap();

    let output = cget(dir.path(), &["install", "fmtlib/fmt"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cget.json"));
}

#[test]
fn test_install_rejects_bad_source() {
    let dir = tempfile::tempdir().unwrap();
    assert!(cget(dir.path(), &["init", "--name", "demo"]).status.success());
    let before = fs::read_to_string(dir.path().join("cget.json")).unwrap();

    let output = cget(dir.path(), &["install", "fmt"]);
    assert!(!output.status.success());
    assert_eq!(
        fs::read_to_string(dir.path().join("cget.json")).unwrap(),
        before
    );
}

#[test]
fn test_remove_alias_reports_unknown_dependency() {
    let dir = tempfile::tempdir().unwrap();
    assert!(cget(dir.path(), &["init", "--name", "demo"]).status.success());

    let output = cget(dir.path(), &["remove", "fmtlib/fmt"]);
    assert!(!output.status.success());
}

#[test]
fn test_cache_path_honors_override() {
    let dir = tempfile::tempdir().unwrap();

    let output = cget(dir.path(), &["--cache-dir", "pkgs", "cache", "path"]);
    assert!(output.status.success());
    assert!(stdout(&output).trim().ends_with("pkgs"));

    let output = cget(dir.path(), &["cache", "clean"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("already empty"));
}

#[test]
fn test_uninstall_parent_target_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    assert!(cget(dir.path(), &["init", "--name", "demo"]).status.success());

    for target in ["x/..", ".."] {
        let output = cget(dir.path(), &["uninstall", target]);
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("Error"));
    }
    assert!(dir.path().join("cget.json").is_file());
    assert!(dir.path().join("extern").is_dir());
}
