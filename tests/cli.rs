//! Command-line tests for the strudel-manifest binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"RIFF").unwrap();
}

fn library() -> TempDir {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "kicks/a.wav");
    touch(dir.path(), "snares/b.wav");
    touch(dir.path(), "tmp/keep.wav");
    fs::write(dir.path().join(".gitignore"), "tmp\n!keep.wav\n").unwrap();
    dir
}

fn cli(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("strudel-manifest").unwrap();
    cmd.arg("--root").arg(root).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_generate_then_up_to_date() -> Result<(), Box<dyn std::error::Error>> {
    let dir = library();

    cli(dir.path())
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Wrote strudel.json (2 files) and updated .manifest_hash.",
        ));
    assert!(dir.path().join("strudel.json").exists());
    assert!(dir.path().join(".manifest_hash").exists());

    cli(dir.path())
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("up-to-date"));

    Ok(())
}

#[test]
fn test_generate_reports_archive() -> Result<(), Box<dyn std::error::Error>> {
    let dir = library();
    cli(dir.path()).arg("generate").assert().success();

    touch(dir.path(), "kicks/c.wav");
    cli(dir.path())
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Archived previous manifest to"))
        .stdout(predicate::str::contains("(3 files)"));

    Ok(())
}

#[test]
fn test_generate_extension_override() -> Result<(), Box<dyn std::error::Error>> {
    let dir = library();
    touch(dir.path(), "loops/x.flac");

    cli(dir.path())
        .args(["generate", "--extension", "flac"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(1 files)"));

    let manifest: Value = serde_json::from_str(&fs::read_to_string(
        dir.path().join("strudel.json"),
    )?)?;
    assert_eq!(manifest["loops"][0], "loops/x.flac");

    Ok(())
}

#[test]
fn test_status_exit_codes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = library();

    cli(dir.path())
        .arg("status")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Manifest stale: manifest_missing"));

    cli(dir.path()).arg("generate").assert().success();

    cli(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Manifest up-to-date"));

    Ok(())
}

#[test]
fn test_status_json() -> Result<(), Box<dyn std::error::Error>> {
    let dir = library();
    cli(dir.path()).arg("generate").assert().success();

    let output = cli(dir.path()).args(["status", "--json"]).output()?;
    assert!(output.status.success());

    let status: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(status["state"], "stable");
    assert!(status["reason"].is_null());
    assert_eq!(status["current"], status["stored"]);

    Ok(())
}

#[test]
fn test_hash_matches_stored_fingerprint() -> Result<(), Box<dyn std::error::Error>> {
    let dir = library();
    cli(dir.path()).arg("generate").assert().success();

    let output = cli(dir.path()).arg("hash").output()?;
    assert!(output.status.success());

    let printed = String::from_utf8(output.stdout)?;
    let printed = printed.trim();
    assert_eq!(printed.len(), 64);
    assert!(printed.chars().all(|c| c.is_ascii_hexdigit()));

    let stored = fs::read_to_string(dir.path().join(".manifest_hash"))?;
    assert_eq!(printed, stored.trim());

    Ok(())
}

#[test]
fn test_explain_matches_scan() -> Result<(), Box<dyn std::error::Error>> {
    let dir = library();

    cli(dir.path())
        .args(["explain", "tmp/keep.wav"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tmp/keep.wav: excluded by 'tmp'"));

    cli(dir.path())
        .args(["explain", "kicks/keep.wav"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "kicks/keep.wav: included (re-included by '!keep.wav')",
        ));

    cli(dir.path())
        .args(["explain", "kicks/a.wav"])
        .assert()
        .success()
        .stdout(predicate::str::diff("kicks/a.wav: included\n"));

    cli(dir.path())
        .args(["explain", ".cache/a.wav"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped (hidden)"));

    Ok(())
}

#[test]
fn test_invalid_rule_fails_with_message() -> Result<(), Box<dyn std::error::Error>> {
    let dir = library();
    fs::write(dir.path().join(".gitignore"), "[unclosed\n")?;

    cli(dir.path())
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("strudel-manifest: "))
        .stderr(predicate::str::contains("[unclosed"));
    assert!(!dir.path().join("strudel.json").exists());

    Ok(())
}

#[test]
fn test_bad_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = library();
    fs::write(dir.path().join(".strudel-manifest.toml"), "bse_url = \"x\"\n")?;

    cli(dir.path())
        .arg("hash")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error loading config"));

    Ok(())
}
