//! Binary-level tests
//!
//! These run the `ollama-chat` executable with piped stdin. The line
//! editor falls back to plain line reading when stdin is not a terminal.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const ENV_VARS: [&str; 7] = [
    "OLLAMA_CHAT_HOST",
    "OLLAMA_CHAT_PORT",
    "OLLAMA_CHAT_MODEL",
    "OLLAMA_CHAT_PROFILE",
    "OLLAMA_CHAT_STREAM",
    "OLLAMA_CHAT_TIMEOUT_SECONDS",
    "OLLAMA_CHAT_STREAM_TIMEOUT_SECONDS",
];

fn chat_command() -> Command {
    let mut cmd = Command::cargo_bin("ollama-chat").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_lists_flags() {
    chat_command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--host"))
        .stdout(predicate::str::contains("--stream"))
        .stdout(predicate::str::contains("--profile"));
}

#[test]
fn test_version() {
    chat_command()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_profile_fails() {
    chat_command()
        .args(["--config", "/nonexistent/config.yaml", "--profile", "mistral"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown profile: mistral"));
}

#[test]
fn test_invalid_config_fails_validation() {
    let (_dir, config_path) = common::temp_config_file("chat:\n  history_preview_chars: 500\n");
    chat_command()
        .arg("--config")
        .arg(config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("history_preview_chars"));
}

#[test]
fn test_unreachable_server_exits_with_status_1() {
    chat_command()
        .args([
            "--config",
            "/nonexistent/config.yaml",
            "-H",
            "127.0.0.1",
            "-p",
            "1",
        ])
        .write_stdin("/quit\n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "Cannot connect to Ollama at http://127.0.0.1:1",
        ))
        .stdout(predicate::str::contains("Host/IP address is correct"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scripted_session() {
    let server = common::mock_ollama(&["gemma2:9b"]).await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gemma2:9b",
            "response": "Hi there",
            "done": true
        })))
        .mount(&server)
        .await;

    let port = server.address().port().to_string();
    let mut cmd = chat_command();
    cmd.args([
        "--config",
        "/nonexistent/config.yaml",
        "-H",
        "127.0.0.1",
        "-p",
        port.as_str(),
    ])
    .write_stdin("Hello\n/history\n/bogus\n/quit\nn\n");

    tokio::task::spawn_blocking(move || {
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Gemma Interactive Chat Interface"))
            .stdout(predicate::str::contains("Gemma: Hi there"))
            .stdout(predicate::str::contains("1. user: Hello"))
            .stdout(predicate::str::contains("2. assistant: Hi there"))
            .stdout(predicate::str::contains("Unknown command: /bogus"))
            .stdout(predicate::str::contains("Save conversation? (y/N)"))
            .stdout(predicate::str::contains("Conversation saved to").not());
    })
    .await
    .unwrap();
}
