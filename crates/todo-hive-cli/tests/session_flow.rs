use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::tempdir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn read_session(home: &Path) -> Value {
    let contents = fs::read_to_string(home.join("session.json")).unwrap();
    serde_json::from_str(&contents).unwrap()
}

fn write_session(home: &Path, session: &Value) {
    fs::write(home.join("session.json"), session.to_string()).unwrap();
}

#[tokio::test]
async fn test_login_stores_token_and_variant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"username": "alice", "password": "secret1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-123",
            "user": {"id": "1", "username": "alice"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"user": {"id": "1", "username": "alice"}})),
        )
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", home.path())
        .args(["--base-url", &server.uri()])
        .args(["login", "--username", "alice", "--password", "secret1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as alice (Worker B backend)"));

    let session = read_session(home.path());
    assert_eq!(session["auth_token"], "tok-123");
    assert_eq!(session["backend_type"], "worker_b");
}

#[tokio::test]
async fn test_login_reads_password_from_stdin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"username": "bob", "password": "hunter22"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t-a"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/todos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"todos": []})))
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", home.path())
        .env("TODO_HIVE_BASE_URL", server.uri())
        .args(["login", "--username", "bob"])
        .write_stdin("hunter22\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Worker A backend"));

    assert_eq!(read_session(home.path())["backend_type"], "worker_a");
}

#[tokio::test]
async fn test_login_with_empty_password_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t"})))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", home.path())
        .args(["--base-url", &server.uri()])
        .args(["login", "--username", "alice"])
        .write_stdin("\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Please enter a username and password",
        ));

    assert!(!home.path().join("session.json").exists());
}

#[tokio::test]
async fn test_login_failure_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": "Invalid username or password"})),
        )
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", home.path())
        .args(["--base-url", &server.uri()])
        .args(["login", "--username", "alice", "--password", "wrong-pass"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid username or password"));
}

#[tokio::test]
async fn test_register_acknowledged_keeps_session_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"message": "User registered successfully"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", home.path())
        .args(["--base-url", &server.uri()])
        .args(["register", "--username", "carol", "--password", "secret1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered carol"))
        .stdout(predicate::str::contains("todo-hive login"));

    let session = read_session(home.path());
    assert!(session.get("auth_token").is_none());
    assert_eq!(session["backend_type"], "worker_a");
}

#[test]
fn test_logout_clears_token_but_keeps_variant() {
    let home = tempdir().unwrap();
    write_session(
        home.path(),
        &json!({"auth_token": "tok", "backend_type": "worker_b"}),
    );

    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", home.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    let session = read_session(home.path());
    assert!(session.get("auth_token").is_none());
    assert_eq!(session["backend_type"], "worker_b");
}

#[test]
fn test_logout_forget_backend_removes_session_file() {
    let home = tempdir().unwrap();
    write_session(
        home.path(),
        &json!({"auth_token": "tok", "backend_type": "worker_b"}),
    );

    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", home.path())
        .args(["logout", "--forget-backend"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backend detection reset"));

    assert!(!home.path().join("session.json").exists());
}

#[test]
fn test_token_show_without_session_fails() {
    let home = tempdir().unwrap();

    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", home.path())
        .args(["token", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_token_show_prints_stored_token() {
    let home = tempdir().unwrap();
    write_session(home.path(), &json!({"auth_token": "tok-xyz"}));

    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", home.path())
        .args(["token", "show"])
        .assert()
        .success()
        .stdout(predicate::str::diff("tok-xyz\n"));
}

#[tokio::test]
async fn test_whoami_with_rejected_token_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid token"})))
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    write_session(
        home.path(),
        &json!({"auth_token": "stale", "backend_type": "worker_b"}),
    );

    cargo_bin_cmd!("todo-hive")
        .env("TODO_HIVE_HOME", home.path())
        .args(["--base-url", &server.uri()])
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid token"));

    assert!(read_session(home.path()).get("auth_token").is_none());
}
