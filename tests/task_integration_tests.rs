//! Integration tests for the task board

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::TestApp;

fn days_from_today(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days)).to_string()
}

#[tokio::test]
async fn create_task_defaults_to_pending_medium() {
    let app = TestApp::new().await;
    let token = app.sign_up("tasker@example.com").await;

    let (status, body) = app
        .post("/api/v1/tasks", &token, json!({"title": "Send brochure"}))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["priority"], "medium");
    assert_eq!(body["data"]["overdue"], false);

    let (status, _) = app.post("/api/v1/tasks", &token, json!({"title": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tabs_filter_and_count_tasks() {
    let app = TestApp::new().await;
    let token = app.sign_up("board@example.com").await;

    app.post(
        "/api/v1/tasks",
        &token,
        json!({"title": "Late call", "due_date": days_from_today(-3), "priority": "high"}),
    )
    .await;
    app.post(
        "/api/v1/tasks",
        &token,
        json!({"title": "Next week visit", "due_date": days_from_today(7)}),
    )
    .await;
    let (_, done) = app
        .post("/api/v1/tasks", &token, json!({"title": "Already done", "priority": "low"}))
        .await;
    let done_id = done["data"]["id"].as_str().unwrap();
    let (status, toggled) = app
        .post(&format!("/api/v1/tasks/{done_id}/toggle"), &token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["data"]["status"], "completed");

    let (status, body) = app.get("/api/v1/tasks", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["data"][0]["title"], "Late call");
    assert_eq!(body["data"][0]["overdue"], true);
    assert_eq!(body["counts"]["all"], 3);
    assert_eq!(body["counts"]["pending"], 2);
    assert_eq!(body["counts"]["completed"], 1);
    assert_eq!(body["counts"]["overdue"], 1);
    assert_eq!(body["counts"]["high_priority_pending"], 1);

    let (_, body) = app.get("/api/v1/tasks?filter=overdue", &token).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["title"], "Late call");

    let (_, body) = app.get("/api/v1/tasks?filter=completed", &token).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["title"], "Already done");

    let (_, body) = app.get("/api/v1/tasks?filter=pending", &token).await;
    assert_eq!(body["total"], 2);

    let (status, _) = app.get("/api/v1/tasks?filter=someday", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tasks_can_be_scoped_to_a_college() {
    let app = TestApp::new().await;
    let token = app.sign_up("scoped@example.com").await;
    let college = app.create_college(&token, json!({"name": "Scoped College"})).await;

    app.post(
        "/api/v1/tasks",
        &token,
        json!({"title": "College task", "college_id": college}),
    )
    .await;
    app.post("/api/v1/tasks", &token, json!({"title": "Other task"}))
        .await;

    let (_, body) = app
        .get(&format!("/api/v1/tasks?college_id={college}"), &token)
        .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["counts"]["all"], 1);
    assert_eq!(body["data"][0]["college_id"], college);
}

#[tokio::test]
async fn toggle_twice_returns_to_pending() {
    let app = TestApp::new().await;
    let token = app.sign_up("toggler@example.com").await;
    let (_, body) = app
        .post("/api/v1/tasks", &token, json!({"title": "Flip me"}))
        .await;
    let id = body["data"]["id"].as_str().unwrap();
    let uri = format!("/api/v1/tasks/{id}/toggle");

    app.post(&uri, &token, json!({})).await;
    let (_, body) = app.post(&uri, &token, json!({})).await;

    assert_eq!(body["data"]["status"], "pending");
}

#[tokio::test]
async fn update_and_delete_task() {
    let app = TestApp::new().await;
    let token = app.sign_up("updater@example.com").await;
    let (_, body) = app
        .post("/api/v1/tasks", &token, json!({"title": "Draft MoU"}))
        .await;
    let id = body["data"]["id"].as_str().unwrap();

    let (status, body) = app
        .patch(
            &format!("/api/v1/tasks/{id}"),
            &token,
            json!({"priority": "high", "due_date": days_from_today(1)}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Draft MoU");
    assert_eq!(body["data"]["priority"], "high");

    let (status, _) = app.delete(&format!("/api/v1/tasks/{id}"), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let missing = Uuid::new_v4();
    let (status, _) = app
        .patch(&format!("/api/v1/tasks/{missing}"), &token, json!({"title": "x"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn null_clears_college_and_due_date() {
    let app = TestApp::new().await;
    let token = app.sign_up("clearer@example.com").await;
    let college = app.create_college(&token, json!({"name": "Linked College"})).await;
    let (_, body) = app
        .post(
            "/api/v1/tasks",
            &token,
            json!({"title": "Linked task", "college_id": college, "due_date": days_from_today(-1)}),
        )
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["overdue"], true);

    let (status, body) = app
        .patch(&format!("/api/v1/tasks/{id}"), &token, json!({"priority": "low"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["college_id"], college);
    assert!(body["data"]["due_date"].is_string());

    let (status, body) = app
        .patch(
            &format!("/api/v1/tasks/{id}"),
            &token,
            json!({"college_id": null, "due_date": null}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["college_id"].is_null());
    assert!(body["data"]["due_date"].is_null());
    assert_eq!(body["data"]["overdue"], false);
    assert_eq!(body["data"]["priority"], "low");
}
