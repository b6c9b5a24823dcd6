use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("termfolio").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: termfolio <COMMAND>"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("persona"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_cli_serve_help() {
    let mut cmd = Command::cargo_bin("termfolio").unwrap();
    cmd.arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: termfolio serve"))
        .stdout(predicate::str::contains("--port <PORT>"))
        .stdout(predicate::str::contains("--model <MODEL>"))
        .stdout(predicate::str::contains("--profile <PROFILE>"));
}

#[test]
fn test_cli_chat_help() {
    let mut cmd = Command::cargo_bin("termfolio").unwrap();
    cmd.arg("chat")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: termfolio chat"))
        .stdout(predicate::str::contains("--relay-url <RELAY_URL>"))
        .stdout(predicate::str::contains("--timeout-secs <TIMEOUT_SECS>"));
}

#[test]
fn test_cli_no_command() {
    // Running without a command should show help/usage
    let mut cmd = Command::cargo_bin("termfolio").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage: termfolio <COMMAND>"));
}

#[test]
fn test_persona_prints_preamble_for_date() {
    let mut cmd = Command::cargo_bin("termfolio").unwrap();
    cmd.args(["persona", "--date", "2026-10-18"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("IMPORTANT: You ARE Arun Tej."))
        .stdout(predicate::str::contains("CURRENT DATE: October 18, 2026"))
        .stdout(predicate::str::contains("agnolas1@asu.edu"));
}

#[test]
fn test_persona_with_profile_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "{}",
        json!({"name": "Jane Doe", "email": "jane@example.com", "skills": ["Rust", "Tokio"]})
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("termfolio").unwrap();
    cmd.args(["persona", "--date", "2025-03-05", "--profile"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("You ARE Jane Doe."))
        .stdout(predicate::str::contains("Never say \"Jane\""))
        .stdout(predicate::str::contains("March 5, 2025"))
        .stdout(predicate::str::contains("- Tokio"))
        .stdout(predicate::str::contains("jane@example.com"));
}

#[test]
fn test_persona_rejects_missing_profile() {
    let mut cmd = Command::cargo_bin("termfolio").unwrap();
    cmd.args(["persona", "--profile", "/definitely/not/here.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read profile"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ask_prints_relay_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "I live in Tempe, AZ"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    tokio::task::spawn_blocking(move || {
        Command::cargo_bin("termfolio")
            .unwrap()
            .args(["ask", "--relay-url", &uri, "Where do you live?"])
            .assert()
            .success()
            .stdout(predicate::str::contains("I live in Tempe, AZ"));
    })
    .await
    .unwrap();
}

#[test]
fn test_ask_unreachable_relay_prints_fallback() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut cmd = Command::cargo_bin("termfolio").unwrap();
    cmd.args(["ask", "--relay-url", &format!("http://127.0.0.1:{}", port), "Hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "I'm having trouble processing that. Please email me at agnolas1@asu.edu",
        ));
}
