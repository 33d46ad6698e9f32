mod common;

use std::time::Duration;

use smartlab_client::gateway::ApiRequest;
use smartlab_client::{AuthState, Error, Notice, Route};

use crate::common::fake_lab::{FRESH_ACCESS, FakeLab, STALE_ACCESS, fake_session};
use crate::common::{expired_session_for, panel, settings, spawn_mock};

#[tokio::test]
async fn test_login_redirects_by_role() {
    let base_url = spawn_mock().await;

    let mut teacher = panel(&settings(&base_url), None, true).await;
    let route = teacher.panel.login("teacher1", "pass123").await.unwrap();

    assert_eq!(route, Some(Route::TeacherDashboard));
    assert_eq!(teacher.panel.auth_state().await, AuthState::Authenticated);
    assert_eq!(teacher.session.username().await, "teacher1");
    assert!(teacher.drain().contains(&Notice::Redirect(Route::TeacherDashboard)));

    let student = panel(&settings(&base_url), None, true).await;
    let route = student.panel.login("student1", "pass123").await.unwrap();

    assert_eq!(route, Some(Route::StudentDashboard));
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let base_url = spawn_mock().await;
    let mut test = panel(&settings(&base_url), None, true).await;

    let err = test.panel.login("teacher1", "wrong").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(test.panel.auth_state().await, AuthState::Unauthenticated);
    assert_eq!(
        test.drain(),
        vec![Notice::Error("Invalid username or password".to_string())]
    );
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let (lab, base_url) = FakeLab::default().spawn().await;
    let test = panel(&settings(&base_url), None, true).await;

    let err = test.panel.login("teacher1", "").await.unwrap_err();

    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(lab.requests(), 0);
}

#[tokio::test]
async fn test_unrecognised_role() {
    let (_lab, base_url) = FakeLab {
        role: "janitor".to_string(),
        ..Default::default()
    }
    .spawn()
    .await;
    let mut test = panel(&settings(&base_url), Some(fake_session(FRESH_ACCESS)), true).await;

    assert_eq!(test.panel.dashboard().await.unwrap(), None);
    assert_eq!(
        test.drain(),
        vec![Notice::Error("Role not recognized!".to_string())]
    );
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed_against_mock() {
    let base_url = spawn_mock().await;
    let expired = expired_session_for("teacher1", "teacher");
    let test = panel(&settings(&base_url), Some(expired.clone()), true).await;

    let devices = test.panel.load_devices().await.unwrap();
    let response = test.panel.protected().await.unwrap();

    assert_eq!(devices.len(), 3);
    assert_eq!(response.message, "Hello teacher1, this is protected data");

    let rotated = test.session.current().await.unwrap();
    assert_eq!(rotated.username, "teacher1");
    assert_ne!(rotated.access_token, expired.access_token);
    assert_ne!(rotated.refresh_token, expired.refresh_token);
}

#[tokio::test]
async fn test_single_refresh_then_retry() {
    let (lab, base_url) = FakeLab::default().spawn().await;
    let test = panel(&settings(&base_url), Some(fake_session(STALE_ACCESS)), true).await;

    let devices = test.panel.load_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(lab.refreshes(), 1);
    assert_eq!(lab.requests(), 2);
    assert_eq!(test.session.access_token().await.as_deref(), Some(FRESH_ACCESS));
}

#[tokio::test]
async fn test_failed_refresh_clears_session_and_redirects() {
    let (lab, base_url) = FakeLab {
        refresh_ok: false,
        ..Default::default()
    }
    .spawn()
    .await;
    let mut test = panel(&settings(&base_url), Some(fake_session(STALE_ACCESS)), true).await;

    let err = test.panel.load_devices().await.unwrap_err();

    assert!(matches!(err, Error::SessionExpired));
    assert_eq!(lab.refreshes(), 1);
    assert_eq!(lab.requests(), 1);
    assert!(test.session.current().await.is_none());
    assert_eq!(test.panel.auth_state().await, AuthState::Unauthenticated);
    assert_eq!(test.drain().last(), Some(&Notice::Redirect(Route::Login)));
}

#[tokio::test]
async fn test_rejected_replay_is_returned_without_another_refresh() {
    let (lab, base_url) = FakeLab {
        reject_all_tokens: true,
        ..Default::default()
    }
    .spawn()
    .await;
    let mut test = panel(&settings(&base_url), Some(fake_session(STALE_ACCESS)), true).await;

    let err = test.panel.load_devices().await.unwrap_err();

    assert!(matches!(err, Error::Http { .. }));
    assert!(err.is_unauthorized());
    assert_eq!(lab.refreshes(), 1);
    assert_eq!(lab.requests(), 2);
    assert_eq!(test.session.access_token().await.as_deref(), Some(FRESH_ACCESS));

    let notices = test.drain();
    assert_eq!(
        notices,
        vec![Notice::Error("Invalid or expired token".to_string())]
    );
    assert!(!notices.contains(&Notice::Redirect(Route::Login)));
}

#[tokio::test]
async fn test_unauthorized_without_session_redirects_to_login() {
    let (lab, base_url) = FakeLab::default().spawn().await;
    let mut test = panel(&settings(&base_url), None, true).await;

    let err = test.panel.load_devices().await.unwrap_err();

    assert!(matches!(err, Error::NotAuthenticated));
    assert_eq!(lab.refreshes(), 0);
    assert_eq!(test.drain().last(), Some(&Notice::Redirect(Route::Login)));
}

#[tokio::test]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let (lab, base_url) = FakeLab::default().spawn().await;
    let test = panel(&settings(&base_url), Some(fake_session(STALE_ACCESS)), true).await;

    let panel = &test.panel;
    let (a, b, c, d) = tokio::join!(
        panel.load_devices(),
        panel.load_devices(),
        panel.load_logs(None),
        panel.dashboard()
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok() && d.is_ok());
    assert_eq!(lab.refreshes(), 1);
}

#[tokio::test]
async fn test_request_timeout() {
    let (_lab, base_url) = FakeLab::default().spawn().await;
    let mut settings = settings(&base_url);
    settings.api.timeout = 1;
    let test = panel(&settings, Some(fake_session(FRESH_ACCESS)), true).await;

    let started = std::time::Instant::now();
    let gateway = smartlab_client::AuthGateway::new(&settings, test.session.clone()).unwrap();
    let err = gateway
        .fetch::<serde_json::Value>(&ApiRequest::get("/slow"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let (_lab, base_url) = FakeLab::default().spawn().await;
    let mut test = panel(&settings(&base_url), Some(fake_session(FRESH_ACCESS)), true).await;

    test.panel.logout().await.unwrap();

    assert!(test.session.current().await.is_none());
    assert_eq!(test.drain().last(), Some(&Notice::Redirect(Route::Login)));
}
