use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use deploy::{
    sign, BranchName, CommandRunner, ExecutionMode, Registry, RepositoryConfig, RepositoryId,
    Secret, StatusStore, SIGNATURE_HEADER,
};
use runner::ShellCommandRunner;
use serde_json::Value;
use store::JsonFileStatusStore;
use tempfile::TempDir;
use tower::ServiceExt;

use super::*;

// Appends one line per run so tests can count executor invocations.
const RECORD_RUN: &str = "echo run >> runs.log";

const MAIN_PUSH: &str = r#"{"ref":"refs/heads/main","after":"5f1c2a"}"#;

struct Harness {
    dir: TempDir,
    app: Router,
    deployer: Deployer,
}

impl Harness {
    async fn new(mode: ExecutionMode, command: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let deployer = restore(dir.path(), &["app"], mode, command).await;
        Self {
            app: router(deployer.clone()),
            dir,
            deployer,
        }
    }

    fn runs(&self) -> usize {
        std::fs::read_to_string(self.dir.path().join("runs.log"))
            .map(|log| log.lines().count())
            .unwrap_or(0)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        send(&self.app, request).await
    }

    async fn status_json(&self) -> Value {
        let (code, body) = self.send(get("/status.json")).await;
        assert_eq!(code, StatusCode::OK);
        serde_json::from_str(&body).unwrap()
    }
}

async fn restore(dir: &Path, ids: &[&str], mode: ExecutionMode, command: &str) -> Deployer {
    let registry = Registry::new(ids.iter().map(|raw| RepositoryConfig {
        id: RepositoryId::new(*raw).unwrap(),
        secret: Secret::new("s"),
        working_dir: dir.to_path_buf(),
        command: command.to_string(),
        branch: BranchName::default(),
    }));
    let store = JsonFileStatusStore::new(dir.join("status.json"));
    Deployer::restore(
        Arc::new(registry),
        Arc::new(store) as Arc<dyn StatusStore>,
        Arc::new(ShellCommandRunner::new()) as Arc<dyn CommandRunner>,
        mode,
    )
    .await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let code = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (code, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    request("GET", uri, Body::empty())
}

fn request(method: &str, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap()
}

fn signed_post(uri: &str, body: &str) -> Request<Body> {
    post_with_signature(uri, body, Some(&sign(body.as_bytes(), &Secret::new("s"))))
}

fn post_with_signature(uri: &str, body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

// ---------------------------------------------------------------------------
// Webhook deliveries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_signed_push_to_main_deploys_once() {
    let harness = Harness::new(ExecutionMode::Sync, RECORD_RUN).await;

    let (code, body) = harness.send(signed_post("/app", MAIN_PUSH)).await;

    assert_eq!(code, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "deployed");
    assert!(body["runId"].is_string());
    assert_eq!(harness.runs(), 1);
}

#[tokio::test]
async fn test_known_signature_for_empty_object_is_accepted() {
    let harness = Harness::new(ExecutionMode::Sync, RECORD_RUN).await;
    let expected = "sha256=143ca8d517ba1b181025d732b1cf275d90104fca57bb02a565542978aa18c4b6";

    let (code, _) = harness
        .send(post_with_signature("/app", "{}", Some(expected)))
        .await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(harness.runs(), 1);
}

#[tokio::test]
async fn test_bad_or_missing_signature_is_forbidden_without_side_effects() {
    let harness = Harness::new(ExecutionMode::Sync, RECORD_RUN).await;
    let wrong = sign(b"{}", &Secret::new("guess"));

    for signature in [None, Some("sha256=deadbeef"), Some("garbage"), Some(wrong.as_str())] {
        let (code, body) = harness
            .send(post_with_signature("/app", "{}", signature))
            .await;
        assert_eq!(code, StatusCode::FORBIDDEN, "signature {signature:?}");
        assert_eq!(body, r#"{"error":"forbidden"}"#);
    }

    assert_eq!(harness.runs(), 0);
    assert_eq!(harness.status_json().await, serde_json::json!({}));
}

#[tokio::test]
async fn test_push_to_other_branch_is_acknowledged_and_ignored() {
    let harness = Harness::new(ExecutionMode::Sync, RECORD_RUN).await;

    let (code, body) = harness
        .send(signed_post("/app", r#"{"ref":"refs/heads/dev"}"#))
        .await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, r#"{"status":"ignored"}"#);
    assert_eq!(harness.runs(), 0);
    assert_eq!(harness.status_json().await, serde_json::json!({}));
}

#[tokio::test]
async fn test_unknown_repository_is_not_found() {
    let harness = Harness::new(ExecutionMode::Sync, RECORD_RUN).await;

    let (code, _) = harness.send(signed_post("/other", MAIN_PUSH)).await;

    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(harness.runs(), 0);
}

#[tokio::test]
async fn test_signed_invalid_json_is_a_bad_request() {
    let harness = Harness::new(ExecutionMode::Sync, RECORD_RUN).await;

    for body in ["{\"ref\":", r#"{"ref":["refs/heads/main"]}"#] {
        let (code, response) = harness.send(signed_post("/app", body)).await;
        assert_eq!(code, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(response, r#"{"error":"invalid payload"}"#);
    }
    assert_eq!(harness.runs(), 0);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let harness = Harness::new(ExecutionMode::Sync, RECORD_RUN).await;
    let huge = format!(r#"{{"ref":"refs/heads/main","pad":"{}"}}"#, "x".repeat(MAX_BODY_BYTES));

    let (code, _) = harness.send(signed_post("/app", &huge)).await;

    assert_eq!(code, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(harness.runs(), 0);
}

#[tokio::test]
async fn test_failed_command_returns_500_in_sync_mode() {
    let harness = Harness::new(ExecutionMode::Sync, "echo run >> runs.log; exit 3").await;

    let (code, body) = harness.send(signed_post("/app", MAIN_PUSH)).await;

    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["status"], "failed");

    let status = harness.status_json().await;
    assert_eq!(status["app"]["lastExitCode"], 3);
    assert_eq!(status["app"]["lastError"], deploy::FAILURE_MARKER);
    assert_eq!(status["app"]["lastSuccess"], Value::Null);
}

#[tokio::test]
async fn test_async_mode_accepts_then_records_the_result() {
    let harness = Harness::new(ExecutionMode::Async, RECORD_RUN).await;

    let (code, body) = harness.send(signed_post("/app", MAIN_PUSH)).await;
    assert_eq!(code, StatusCode::ACCEPTED);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["status"], "accepted");

    harness.deployer.drain().await;

    assert_eq!(harness.runs(), 1);
    let status = harness.status_json().await;
    assert_eq!(status["app"]["lastExitCode"], 0);
    assert!(status["app"]["lastSuccess"].is_string());
    assert_eq!(status["app"]["lastError"], Value::Null);
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_informational_paths_need_no_signature() {
    let harness = Harness::new(ExecutionMode::Sync, RECORD_RUN).await;

    for uri in ["/", "/index.html"] {
        let (code, body) = harness.send(get(uri)).await;
        assert_eq!(code, StatusCode::OK, "GET {uri}");
        assert!(body.contains("<td>app</td>"));
    }
    assert_eq!(harness.send(get("/healthz")).await, (StatusCode::OK, "ok".to_string()));
}

#[tokio::test]
async fn test_other_gets_are_not_found() {
    let harness = Harness::new(ExecutionMode::Sync, RECORD_RUN).await;

    for uri in ["/app", "/missing", "/a/b/c"] {
        let (code, _) = harness.send(get(uri)).await;
        assert_eq!(code, StatusCode::NOT_FOUND, "GET {uri}");
    }
}

#[tokio::test]
async fn test_posts_to_informational_paths_are_unknown_repositories() {
    let harness = Harness::new(ExecutionMode::Sync, RECORD_RUN).await;

    for uri in ["/status.json", "/", "/a/b"] {
        let (code, _) = harness.send(signed_post(uri, MAIN_PUSH)).await;
        assert_eq!(code, StatusCode::NOT_FOUND, "POST {uri}");
    }
}

#[tokio::test]
async fn test_other_methods_are_not_allowed() {
    let harness = Harness::new(ExecutionMode::Sync, RECORD_RUN).await;

    for (method, uri) in [("PUT", "/app"), ("DELETE", "/"), ("PATCH", "/status.json"), ("PUT", "/a/b")] {
        let (code, _) = harness.send(request(method, uri, Body::empty())).await;
        assert_eq!(code, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
    }
    assert_eq!(harness.runs(), 0);
}

// ---------------------------------------------------------------------------
// Restart
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_restart_reproduces_status_for_registered_repositories() {
    let harness = Harness::new(ExecutionMode::Sync, RECORD_RUN).await;
    harness.send(signed_post("/app", MAIN_PUSH)).await;
    let before = harness.status_json().await;
    assert!(before["app"]["lastSuccess"].is_string());

    let restarted = restore(harness.dir.path(), &["app"], ExecutionMode::Sync, RECORD_RUN).await;
    let (_, after) = send(&router(restarted), get("/status.json")).await;

    assert_eq!(serde_json::from_str::<Value>(&after).unwrap(), before);
}

#[tokio::test]
async fn test_restart_drops_repositories_removed_from_the_registry() {
    let harness = Harness::new(ExecutionMode::Sync, RECORD_RUN).await;
    harness.send(signed_post("/app", MAIN_PUSH)).await;

    let restarted = restore(harness.dir.path(), &["web"], ExecutionMode::Sync, RECORD_RUN).await;
    let (_, after) = send(&router(restarted), get("/status.json")).await;

    assert_eq!(serde_json::from_str::<Value>(&after).unwrap(), serde_json::json!({}));
}

#[tokio::test]
async fn test_corrupt_status_file_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("status.json"), "not json at all").unwrap();

    let deployer = restore(dir.path(), &["app"], ExecutionMode::Sync, RECORD_RUN).await;
    let (code, body) = send(&router(deployer), get("/status.json")).await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, "{}");
}
