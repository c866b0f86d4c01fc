// Integration tests for the HTTP API
//
// Requests go straight through the axum router with tower's `oneshot`;
// interviews run on fake speech engines.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{settle, FakeFactory, Harness, ScriptedModel};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use voice_interviewer::interview::InterviewConfig;
use voice_interviewer::speech::PermissionState;
use voice_interviewer::{create_router, AppState, LlmCodeEvaluator};

struct Api {
    app: Router,
    state: AppState,
    factory: Arc<FakeFactory>,
}

fn api(harness: &Harness) -> Api {
    let factory = FakeFactory::from_harness(harness);
    let reviewer = ScriptedModel::new(
        r#"{"passed": true, "score": 75, "feedback": "Works for the given cases.", "suggestions": [], "timeComplexity": "O(n)", "spaceComplexity": "O(n)"}"#,
    );
    let state = AppState::new(
        factory.clone(),
        Arc::new(LlmCodeEvaluator::new(reviewer)),
        InterviewConfig::default(),
    );
    Api {
        app: create_router(state.clone()),
        state,
        factory,
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

#[tokio::test(start_paused = true)]
async fn test_health_check() {
    let harness = Harness::new();
    let api = api(&harness);

    let (status, body) = send(&api.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test(start_paused = true)]
async fn test_start_status_and_end() {
    let harness = Harness::new();
    let api = api(&harness);

    let (status, body) = send(
        &api.app,
        "POST",
        "/interviews/start",
        Some(json!({
            "interview_id": "int-1",
            "company": "Acme",
            "role": "Data Engineer",
            "type": "behavioral",
            "candidate_name": "Riley"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interview_id"], "int-1");
    assert_eq!(body["status"], "in_progress");

    settle(Duration::from_secs(2)).await;

    let (status, body) = send(&api.app, "GET", "/interviews/int-1/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["max_questions"], 5);

    let (status, body) = send(&api.app, "GET", "/interviews/int-1/transcript", None).await;
    assert_eq!(status, StatusCode::OK);
    let welcome = body[0]["message"].as_str().unwrap();
    assert_eq!(body[0]["speaker"], "interviewer");
    assert!(welcome.starts_with("Hello Riley! Welcome to your behavioral interview"));

    let (status, body) = send(&api.app, "POST", "/interviews/int-1/end", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ended_early");
    assert_eq!(body["phase"], "ended");

    // Ended interviews stay queryable
    let (status, body) = send(&api.app, "GET", "/interviews/int-1/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ended_early");
}

#[tokio::test(start_paused = true)]
async fn test_generated_id_and_duplicate_start() {
    let harness = Harness::new();
    let api = api(&harness);

    let (status, body) = send(&api.app, "POST", "/interviews/start", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["interview_id"].as_str().unwrap().to_string();
    assert!(id.starts_with("interview-"));

    let (status, body) = send(
        &api.app,
        "POST",
        "/interviews/start",
        Some(json!({ "interview_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    api.state.shutdown_all().await;
}

#[tokio::test(start_paused = true)]
async fn test_unknown_interview_is_not_found() {
    let harness = Harness::new();
    let api = api(&harness);

    for (method, path) in [
        ("GET", "/interviews/nope/status"),
        ("GET", "/interviews/nope/transcript"),
        ("POST", "/interviews/nope/end"),
        ("POST", "/interviews/nope/help"),
        ("POST", "/interviews/nope/interrupt"),
        ("POST", "/interviews/nope/listen"),
        ("POST", "/interviews/nope/permission"),
    ] {
        let (status, body) = send(&api.app, method, path, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, path);
        assert_eq!(body["error"], "Interview nope not found");
    }
}

#[tokio::test(start_paused = true)]
async fn test_permission_denied_then_retried() {
    let harness = Harness::new();
    harness.permission.set(PermissionState::Denied);
    let api = api(&harness);
    let start = json!({ "interview_id": "int-2" });

    let (status, body) = send(&api.app, "POST", "/interviews/start", Some(start.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Microphone access denied"));

    // The refused interview stays around, not started
    let (status, body) = send(&api.app, "GET", "/interviews/int-2/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_started");

    let (_, body) = send(&api.app, "POST", "/interviews/int-2/permission", None).await;
    assert_eq!(body["granted"], false);

    harness.permission.set(PermissionState::Granted);
    let (_, body) = send(&api.app, "POST", "/interviews/int-2/permission", None).await;
    assert_eq!(body["granted"], true);

    let (status, body) = send(&api.app, "POST", "/interviews/start", Some(start.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "in_progress");

    let (_, body) = send(&api.app, "GET", "/interviews/int-2/status", None).await;
    assert_eq!(body["status"], "in_progress");

    // Once running, the id is taken
    let (status, _) = send(&api.app, "POST", "/interviews/start", Some(start)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    api.state.shutdown_all().await;
}

#[tokio::test(start_paused = true)]
async fn test_factory_failure_is_server_error() {
    let harness = Harness::new();
    let api = api(&harness);
    api.factory.fail.store(true, Ordering::SeqCst);

    let (status, _) = send(&api.app, "POST", "/interviews/start", Some(json!({}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(api.state.sessions.read().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_candidate_controls() {
    let harness = Harness::new();
    let api = api(&harness);

    send(
        &api.app,
        "POST",
        "/interviews/start",
        Some(json!({ "interview_id": "int-3" })),
    )
    .await;
    settle(Duration::from_millis(100)).await;

    // Nothing is on hold, so there is nothing to resume
    let (status, body) = send(&api.app, "POST", "/interviews/int-3/listen", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], false);

    let (status, body) = send(&api.app, "POST", "/interviews/int-3/interrupt", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interrupted"], true);

    let (_, body) = send(&api.app, "POST", "/interviews/int-3/help", None).await;
    assert_eq!(body["accepted"], true);

    let (_, body) = send(&api.app, "POST", "/interviews/int-3/permission", None).await;
    assert_eq!(body["granted"], true);

    api.state.shutdown_all().await;
    let session = api.state.session("int-3").await.unwrap();
    assert!(session.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_evaluate_code() {
    let harness = Harness::new();
    let api = api(&harness);

    let (status, body) = send(
        &api.app,
        "POST",
        "/practice/evaluate",
        Some(json!({
            "code": "def solve(xs): return sorted(xs)",
            "problem": { "title": "Sort", "description": "Sort the list", "difficulty": "easy" },
            "testCases": [{ "input": [3, 1, 2], "output": [1, 2, 3] }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["passed"], true);
    assert_eq!(body["score"], 75);
    assert_eq!(body["timeComplexity"], "O(n)");
}
