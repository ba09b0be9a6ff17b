use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_path_command() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_creates_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    assert!(!config_path.exists());

    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("base_url = \"http://localhost:5000\""));
    assert!(contents.contains("backend = \"auto\""));
}

#[test]
fn test_config_init_fails_if_exists() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "# existing config").unwrap();

    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_set_base_url_is_used_by_status() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", dir.path())
        .env_remove("TODO_HIVE_BASE_URL")
        .args(["config", "set-base-url", "http://127.0.0.1:5001/"])
        .assert()
        .success();

    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", dir.path())
        .env_remove("TODO_HIVE_BASE_URL")
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Base URL: http://127.0.0.1:5001"))
        .stdout(predicate::str::contains("Worker B (assumed)"))
        .stdout(predicate::str::contains("not logged in"));
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", dir.path())
        .args(["--base-url", "not a url", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid base URL"));
}
