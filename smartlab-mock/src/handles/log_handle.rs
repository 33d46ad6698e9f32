use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use serde_json::Value;
use smartlab_api::models::*;
use smartlab_api::routes;

use crate::middlewares::{TokenState, optional_auth};
use crate::services::LabService;

#[derive(Clone)]
pub struct LogState {
    pub lab: Arc<LabService>,
}

pub fn log_router(log_state: LogState, token_state: TokenState) -> Router {
    Router::new()
        .route(routes::LOGS, get(get_logs))
        .route(routes::ADD_LOG, post(add_log))
        .route_layer(middleware::from_fn_with_state(token_state, optional_auth))
        .with_state(log_state)
}

pub async fn get_logs(
    State(state): State<LogState>,
    Query(query): Query<LogQuery>,
) -> Json<Vec<Value>> {
    Json(state.lab.logs(query.device.as_deref()).await)
}

pub async fn add_log(
    State(state): State<LogState>,
    Json(entry): Json<Value>,
) -> (StatusCode, Json<MessageResponse>) {
    state.lab.append_log(entry).await;

    (
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Log added".to_string(),
        }),
    )
}
