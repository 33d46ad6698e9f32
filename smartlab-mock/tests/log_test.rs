use axum::http::{Method, StatusCode};
use serde_json::json;
use smartlab_mock::services::format_timestamp;
use time::OffsetDateTime;

mod common;
use common::mock_app::MockApp;

#[tokio::test]
async fn test_logs_filter() {
    let app = MockApp::new();

    for (id, action) in [(1, "on"), (2, "on"), (1, "off")] {
        let (status, _) = app
            .send(
                Method::POST,
                &format!("/devices/{}/toggle", id),
                Some(json!({"action": action, "username": "teacher1"})),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, logs) = app.send(Method::GET, "/logs?device=Projector", None, None).await;
    assert_eq!(logs.as_array().map(Vec::len), Some(2));

    let (_, logs) = app.send(Method::GET, "/logs?device=2", None, None).await;
    assert_eq!(logs.as_array().map(Vec::len), Some(1));

    let (_, logs) = app.send(Method::GET, "/logs?device=All", None, None).await;
    assert_eq!(logs.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_delete_logs_keeps_recent_entries() {
    let app = MockApp::new();
    let recent = format_timestamp(OffsetDateTime::now_utc());

    let (status, _) = app
        .send(
            Method::POST,
            "/logs/add",
            Some(json!({"action": "on", "device": "Fan", "timestamp": "2020-01-01 00:00:00"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    app.send(
        Method::POST,
        "/logs/add",
        Some(json!({"action": "off", "device": "Fan", "timestamp": recent})),
        None,
    )
    .await;

    let (status, body) = app
        .send(Method::POST, "/devices/delete-logs", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Deleted 1 log entries older than 24 hours");

    let (_, logs) = app.send(Method::GET, "/logs", None, None).await;
    assert_eq!(logs.as_array().map(Vec::len), Some(1));
    assert_eq!(logs[0]["action"], "off");
}
