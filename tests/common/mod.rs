use std::fs;
use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Start a mock server whose `/api/tags` lists `models`
#[allow(dead_code)]
pub async fn mock_ollama(models: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    let tags: Vec<_> = models.iter().map(|name| json!({ "name": name })).collect();
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": tags })))
        .mount(&server)
        .await;
    server
}

/// Newline-delimited streaming body, one record per fragment plus a final done record
#[allow(dead_code)]
pub fn ndjson_reply(model: &str, fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        body.push_str(&json!({ "model": model, "response": fragment, "done": false }).to_string());
        body.push('\n');
    }
    body.push_str(
        &json!({ "model": model, "response": "", "done": true, "eval_count": fragments.len() })
            .to_string(),
    );
    body.push('\n');
    body
}
