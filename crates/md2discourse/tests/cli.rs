use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

fn write_config(dir: &Path, url: &str) {
    fs::write(
        dir.join("config.json"),
        format!(
            r#"{{"discourse_api_key": "key", "discourse_api_username": "system", "discourse_url": "{url}"}}"#
        ),
    )
    .expect("write config");
}

#[test]
fn test_help_lists_every_mode() {
    cargo_bin_cmd!("md2discourse")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--preview"))
        .stdout(predicate::str::contains("--list-categories"))
        .stdout(predicate::str::contains("--test-connection"))
        .stdout(predicate::str::contains("--directory"))
        .stdout(predicate::str::contains("--debug"));
}

#[test]
fn test_missing_config_exits_non_zero() {
    let temp = tempdir().expect("tempdir");
    cargo_bin_cmd!("md2discourse")
        .current_dir(temp.path())
        .env_remove("DISCOURSE_URL")
        .arg("--list-categories")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Configuration file 'config.json' not found.",
        ));
}

#[test]
fn test_malformed_config_is_reported() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("config.json"), "{not json").expect("write config");
    cargo_bin_cmd!("md2discourse")
        .current_dir(temp.path())
        .arg("--test-connection")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"));
}

#[test]
fn test_no_mode_prints_help() {
    let temp = tempdir().expect("tempdir");
    write_config(temp.path(), "http://127.0.0.1:9");
    cargo_bin_cmd!("md2discourse")
        .current_dir(temp.path())
        .arg("--category")
        .arg("4")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_preview_prints_title_and_content() {
    let temp = tempdir().expect("tempdir");
    write_config(temp.path(), "http://127.0.0.1:9");
    fs::write(
        temp.path().join("notes.md"),
        "# Release Notes\n\nSomething happened.",
    )
    .expect("write md");

    cargo_bin_cmd!("md2discourse")
        .current_dir(temp.path())
        .arg("--preview")
        .arg("notes.md")
        .assert()
        .success()
        .stdout(predicate::str::contains("Previewing 'notes.md':"))
        .stdout(predicate::str::contains(
            "Discourse Topic Title:\nRelease Notes\n",
        ))
        .stdout(predicate::str::contains(
            "Discourse Topic Content:\n<p>Something happened.</p>\n",
        ));
}

#[test]
fn test_connection_failure_is_reported_not_raised() {
    let temp = tempdir().expect("tempdir");
    write_config(temp.path(), "http://127.0.0.1:1");
    cargo_bin_cmd!("md2discourse")
        .current_dir(temp.path())
        .env_remove("DISCOURSE_URL")
        .arg("-t")
        .assert()
        .success()
        .stdout(predicate::str::contains("Connection failed"));
}

#[test]
fn test_dotenv_rust_log_enables_logging() {
    let temp = tempdir().expect("tempdir");
    write_config(temp.path(), "http://127.0.0.1:9");
    fs::write(temp.path().join(".env"), "RUST_LOG=debug\n").expect("write .env");
    fs::write(temp.path().join("notes.md"), "# Title\n\nbody").expect("write md");

    cargo_bin_cmd!("md2discourse")
        .current_dir(temp.path())
        .env_remove("RUST_LOG")
        .arg("--preview")
        .arg("notes.md")
        .assert()
        .success()
        .stderr(predicate::str::contains("dispatching"));
}
