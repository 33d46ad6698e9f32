//! Scripted backend that records what the client sends.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};
use smartlab_client::Session;
use tokio::net::TcpListener;

pub const STALE_ACCESS: &str = "stale-access";
pub const FRESH_ACCESS: &str = "fresh-access";
pub const REFRESH: &str = "refresh-1";

pub fn fake_session(access_token: &str) -> Session {
    Session {
        username: "teacher1".to_string(),
        access_token: access_token.to_string(),
        refresh_token: REFRESH.to_string(),
    }
}

pub struct FakeLab {
    pub refresh_calls: AtomicUsize,
    pub requests: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub refresh_ok: bool,
    /// Keep answering 401 even to the token issued by `/auth/refresh`
    pub reject_all_tokens: bool,
    pub toggle_delay: Duration,
    pub role: String,
    pub devices: Mutex<Value>,
    pub logs: Mutex<Value>,
    pub toggles: Mutex<Vec<Value>>,
}

impl Default for FakeLab {
    fn default() -> Self {
        Self {
            refresh_calls: AtomicUsize::new(0),
            requests: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            refresh_ok: true,
            reject_all_tokens: false,
            toggle_delay: Duration::ZERO,
            role: "teacher".to_string(),
            devices: Mutex::new(json!([
                {"id": 1, "name": "Projector", "status": "off"},
                {"id": 2, "name": "Smart Light", "status": "on"},
                {"name": "no id"}
            ])),
            logs: Mutex::new(json!([])),
            toggles: Mutex::new(Vec::new()),
        }
    }
}

impl FakeLab {
    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Serves the fake on an ephemeral port and returns its base URL.
    pub async fn spawn(self) -> (Arc<Self>, String) {
        let lab = Arc::new(self);

        let router = Router::new()
            .route("/devices", get(devices))
            .route("/devices/:id/toggle", post(toggle))
            .route("/devices/:id/schedule", post(schedule))
            .route("/devices/delete-logs", post(delete_logs))
            .route("/logs", get(logs))
            .route("/users/role", get(role))
            .route("/auth/refresh", post(refresh))
            .route("/slow", get(slow))
            .with_state(lab.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        (lab, format!("http://{}", address))
    }

    fn hit(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        match bearer(headers) {
            Some(FRESH_ACCESS) if !self.reject_all_tokens => Ok(()),
            _ => Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid or expired token"})),
            )
                .into_response()),
        }
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

async fn devices(State(lab): State<Arc<FakeLab>>, headers: HeaderMap) -> Response {
    lab.hit();
    if let Err(response) = lab.authorize(&headers) {
        return response;
    }

    Json(lab.devices.lock().clone()).into_response()
}

async fn toggle(
    State(lab): State<Arc<FakeLab>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    lab.hit();
    if let Err(response) = lab.authorize(&headers) {
        return response;
    }

    tokio::time::sleep(lab.toggle_delay).await;
    let action = body["action"].as_str().unwrap_or_default().to_string();
    lab.toggles.lock().push(body);

    Json(json!({
        "message": format!("Device {} successfully!", action),
        "device": {"id": id, "name": "Projector", "status": action}
    }))
    .into_response()
}

async fn schedule(State(lab): State<Arc<FakeLab>>, headers: HeaderMap) -> Response {
    lab.hit();
    if let Err(response) = lab.authorize(&headers) {
        return response;
    }

    Json(json!({"message": "Schedule set"})).into_response()
}

async fn delete_logs(State(lab): State<Arc<FakeLab>>, headers: HeaderMap) -> Response {
    lab.hit();
    if let Err(response) = lab.authorize(&headers) {
        return response;
    }

    lab.delete_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({"message": "Deleted 0 log entries older than 24 hours"})).into_response()
}

async fn logs(State(lab): State<Arc<FakeLab>>, headers: HeaderMap) -> Response {
    lab.hit();
    if let Err(response) = lab.authorize(&headers) {
        return response;
    }

    Json(lab.logs.lock().clone()).into_response()
}

async fn role(State(lab): State<Arc<FakeLab>>, headers: HeaderMap) -> Response {
    lab.hit();
    if let Err(response) = lab.authorize(&headers) {
        return response;
    }

    Json(json!({"role": lab.role})).into_response()
}

async fn refresh(State(lab): State<Arc<FakeLab>>, headers: HeaderMap) -> Response {
    lab.refresh_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;

    if lab.refresh_ok && bearer(&headers) == Some(REFRESH) {
        Json(json!({"access_token": FRESH_ACCESS, "refresh_token": "refresh-2"})).into_response()
    } else {
        (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Invalid refresh token"})),
        )
            .into_response()
    }
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!([])).into_response()
}
