//! Integration tests for team members and the dashboard summary

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::TestApp;

#[tokio::test]
async fn team_members_crud_and_filters() {
    let app = TestApp::new().await;
    let token = app.sign_up("lead@example.com").await;

    let (status, body) = app
        .post(
            "/api/v1/team-members",
            &token,
            json!({"name": "Ravi Kumar", "email": "ravi@example.com", "department": "North"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "field_executive");
    assert_eq!(body["data"]["status"], "active");
    let ravi = body["data"]["id"].as_str().unwrap().to_string();

    app.post(
        "/api/v1/team-members",
        &token,
        json!({"name": "Meera Iyer", "email": "meera@example.com", "role": "manager"}),
    )
    .await;

    let (_, body) = app.get("/api/v1/team-members?role=manager", &token).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["name"], "Meera Iyer");

    let (_, body) = app.get("/api/v1/team-members?search=north", &token).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["name"], "Ravi Kumar");

    let (status, body) = app
        .patch(
            &format!("/api/v1/team-members/{ravi}"),
            &token,
            json!({"status": "inactive", "role": "team_lead"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "inactive");
    assert_eq!(body["data"]["role"], "team_lead");

    let (status, _) = app
        .delete(&format!("/api/v1/team-members/{ravi}"), &token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get("/api/v1/team-members", &token).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn team_member_requires_email() {
    let app = TestApp::new().await;
    let token = app.sign_up("strict@example.com").await;

    let (status, body) = app
        .post(
            "/api/v1/team-members",
            &token,
            json!({"name": "No Email", "email": "nope"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "email");

    let (status, _) = app
        .post(
            "/api/v1/team-members",
            &token,
            json!({"name": "Bad Role", "email": "bad@example.com", "role": "intern"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_summarizes_everything() {
    let app = TestApp::new().await;
    let token = app.sign_up("boss@example.com").await;
    let yesterday = (Utc::now().date_naive() - Duration::days(1)).to_string();

    let accepted = app
        .create_college(&token, json!({"name": "Accepted College", "status": "accepted"}))
        .await;
    app.create_college(
        &token,
        json!({"name": "Follow-up College", "next_followup_date": yesterday}),
    )
    .await;
    app.create_college(&token, json!({"name": "Quiet College"})).await;
    app.create_college(&token, json!({"name": "Closed College", "status": "rejected"}))
        .await;

    app.post(
        &format!("/api/v1/colleges/{accepted}/interactions"),
        &token,
        json!({"notes": "Signed the agreement", "contact_method": "Email"}),
    )
    .await;
    app.post(
        "/api/v1/tasks",
        &token,
        json!({"title": "Overdue follow-up", "due_date": yesterday, "priority": "high"}),
    )
    .await;
    app.post(
        "/api/v1/team-members",
        &token,
        json!({"name": "Field Exec", "email": "field@example.com"}),
    )
    .await;

    let (status, body) = app.get("/api/v1/dashboard", &token).await;
    assert_eq!(status, StatusCode::OK);

    let summary = &body["data"];
    assert_eq!(summary["colleges"]["total"], 4);
    assert_eq!(summary["colleges"]["accepted"], 1);
    assert_eq!(summary["colleges"]["rejected"], 1);
    assert_eq!(summary["colleges"]["pending"], 2);
    assert_eq!(summary["colleges"]["follow_ups_due"], 1);
    assert_eq!(summary["colleges"]["acceptance_rate"], 25.0);
    assert_eq!(summary["tasks"]["overdue"], 1);
    assert_eq!(summary["team"]["field_executives"], 1);
    assert_eq!(summary["recent_interactions"][0]["notes"], "Signed the agreement");
    assert_eq!(summary["upcoming_tasks"][0]["title"], "Overdue follow-up");
    assert!(body["meta"]["request_id"].is_string());
}
