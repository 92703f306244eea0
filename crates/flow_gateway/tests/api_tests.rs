//! Route-level tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use flow_gateway::{router, AppState};
use flow_memory::{LocalMemory, WorkspaceStore};
use flow_reasoning::providers::MockProvider;
use flow_reasoning::Planner;
use serde_json::{json, Value};
use tower::ServiceExt;

struct Harness {
    app: Router,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let memory = Arc::new(LocalMemory::open(dir.path().join("memory.json")).await);
    let workspace =
        Arc::new(WorkspaceStore::open(dir.path().join("workspace.json"), false).await);
    let planner = Planner::new(Arc::new(MockProvider::new()), memory, workspace);
    Harness {
        app: router(AppState::new(Arc::new(planner))),
        _dir: dir,
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let h = harness().await;
    let (status, body) = send(&h.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn test_get_schedule_requires_query() {
    let h = harness().await;
    let (status, body) = send(&h.app, "POST", "/get_schedule", Some(json!({"query": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Query is required"));
}

#[tokio::test]
async fn test_get_schedule_plans_around_fixed_events() {
    let h = harness().await;
    let (status, _) = send(
        &h.app,
        "POST",
        "/users/default/events",
        Some(json!({
            "title": "Physics Exam",
            "start": "2025-10-18T10:00:00",
            "end": "2025-10-18T12:00:00",
            "category": "exam"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &h.app,
        "POST",
        "/update_task",
        Some(json!({
            "task": {"title": "Math Review", "estimatedMinutes": 120, "priority": "urgent-important"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &h.app,
        "POST",
        "/get_schedule",
        Some(json!({"query": "Please schedule my Saturday"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "plan_schedule");
    assert_eq!(body["errors"], json!([]));
    assert_eq!(body["conflicts"], json!([]));

    let schedule = body["schedule"].as_array().unwrap();
    assert_eq!(schedule.len(), 1);
    assert_eq!(schedule[0]["title"], "Math Review");
    assert_eq!(schedule[0]["start"], "2025-10-18T12:00:00");
    assert_eq!(schedule[0]["priority"], "high");
    assert_eq!(schedule[0]["isAiGenerated"], true);
    assert!(!body["coach_messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_json_bad_request() {
    let h = harness().await;
    let req = Request::builder()
        .method("POST")
        .uri("/get_schedule")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = h.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));

    // Wrong field types are rejected the same way.
    let (status, body) = send(
        &h.app,
        "POST",
        "/users/ana/tasks",
        Some(json!({"title": "Essay", "estimatedMinutes": "lots"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_update_task_requires_task() {
    let h = harness().await;
    let (status, body) = send(&h.app, "POST", "/update_task", Some(json!({"user_id": "ana"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Task data is required");
}

#[tokio::test]
async fn test_task_crud() {
    let h = harness().await;
    let (status, created) = send(
        &h.app,
        "POST",
        "/users/ana/tasks",
        Some(json!({"title": "Read chapter 3", "estimatedMinutes": 45})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    let (status, patched) = send(
        &h.app,
        "PATCH",
        &format!("/users/ana/tasks/{id}"),
        Some(json!({"completed": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["completed"], true);
    assert_eq!(patched["title"], "Read chapter 3");

    let (status, _) = send(&h.app, "DELETE", &format!("/users/ana/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, tasks) = send(&h.app, "GET", "/users/ana/tasks", None).await;
    assert_eq!(tasks, json!([]));
}

#[tokio::test]
async fn test_unknown_task_is_404() {
    let h = harness().await;
    let (status, body) = send(
        &h.app,
        "PATCH",
        "/users/ana/tasks/nope",
        Some(json!({"completed": true})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "task 'nope' not found");

    let (status, _) = send(&h.app, "DELETE", "/users/ana/goals/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_goal_link_counts() {
    let h = harness().await;
    let (status, body) = send(
        &h.app,
        "POST",
        "/add_goal",
        Some(json!({"user_id": "ana", "goal": {"id": "g1", "title": "Pass Calculus", "progress": 40}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    send(
        &h.app,
        "POST",
        "/users/ana/tasks",
        Some(json!({"title": "Problem set", "goalId": "g1", "classId": "math101"})),
    )
    .await;

    let (_, goals) = send(&h.app, "GET", "/users/ana/goals", None).await;
    assert_eq!(goals[0]["title"], "Pass Calculus");
    assert_eq!(goals[0]["linkedTaskCount"], 1);
    assert_eq!(goals[0]["linkedClassCount"], 1);
}

#[tokio::test]
async fn test_preferences_validation() {
    let h = harness().await;
    let (status, prefs) = send(&h.app, "GET", "/users/ana/preferences", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prefs["breakRatio"]["workMinutes"], 25);

    let (status, _) = send(
        &h.app,
        "PUT",
        "/users/ana/preferences",
        Some(json!({"breakRatio": {"workMinutes": 500, "breakMinutes": 5}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, prefs) = send(
        &h.app,
        "PATCH",
        "/users/ana/preferences",
        Some(json!({"workMinutes": 50, "coachPersonality": "minimal"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prefs["breakRatio"]["workMinutes"], 50);
    assert_eq!(prefs["coachPersonality"], "minimal");
}

#[tokio::test]
async fn test_messages_append_reply() {
    let h = harness().await;
    let (status, pair) = send(
        &h.app,
        "POST",
        "/users/ana/messages",
        Some(json!({"content": "How does my week look?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pair[0]["role"], "user");
    assert_eq!(pair[1]["role"], "assistant");

    let (_, history) = send(&h.app, "GET", "/users/ana/messages", None).await;
    assert_eq!(history.as_array().unwrap().len(), 2);
    assert_eq!(history[0]["content"], "How does my week look?");
}

#[tokio::test]
async fn test_chat_command_reply() {
    let h = harness().await;
    let (status, body) = send(
        &h.app,
        "POST",
        "/chat_command",
        Some(json!({"command": "anything for tonight?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["reply"].as_str().unwrap().is_empty());

    let (status, _) = send(&h.app, "POST", "/chat_command", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_feedback_and_insights() {
    let h = harness().await;
    for i in 0..3 {
        let feedback = json!({
            "task_id": format!("t{i}"),
            "scheduled_start": "2025-10-21T20:00:00",
            "scheduled_end": "2025-10-21T21:00:00",
            "completed": false,
            "energy_level": 2,
            "difficulty": 4,
            "satisfaction": 2
        });
        let (status, _) = send(
            &h.app,
            "POST",
            "/feedback",
            Some(json!({"user_id": "ana", "feedback": feedback})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, insights) = send(&h.app, "GET", "/insights/ana", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(insights["time_slots"]["20_1"]["sample_count"], 3);
    assert!(!insights["recommendations"].as_array().unwrap().is_empty());

    // Resubmitting for the same task replaces its sample.
    let (status, _) = send(
        &h.app,
        "POST",
        "/feedback",
        Some(json!({"user_id": "ana", "feedback": {
            "task_id": "t0",
            "scheduled_start": "2025-10-21T20:00:00",
            "scheduled_end": "2025-10-21T21:00:00",
            "completed": true,
            "energy_level": 4,
            "difficulty": 2,
            "satisfaction": 4
        }})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, insights) = send(&h.app, "GET", "/insights/ana", None).await;
    assert_eq!(insights["time_slots"]["20_1"]["sample_count"], 3);

    let (status, _) = send(
        &h.app,
        "POST",
        "/feedback",
        Some(json!({"feedback": {
            "task_id": "t1",
            "scheduled_start": "2025-10-21T20:00:00",
            "scheduled_end": "2025-10-21T21:00:00",
            "energy_level": 9,
            "difficulty": 1,
            "satisfaction": 1
        }})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
