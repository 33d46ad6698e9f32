use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router, middleware};
use smartlab_api::models::*;
use smartlab_api::routes;
use time::OffsetDateTime;

use crate::errors::{ApiError, DeviceError};
use crate::middlewares::{TokenState, optional_auth};
use crate::services::LabService;

#[derive(Clone)]
pub struct DeviceState {
    pub lab: Arc<LabService>,
    /// Age beyond which `delete-logs` purges usage entries
    pub log_max_age: Duration,
}

fn device_path(suffix: &str) -> String {
    format!("{}/:device_id{}", routes::DEVICES, suffix)
}

pub fn device_router(device_state: DeviceState, token_state: TokenState) -> Router {
    Router::new()
        .route(routes::DEVICES, get(get_devices))
        .route(routes::DEVICE_ANALYTICS, get(get_device_analytics))
        .route(routes::DELETE_LOGS, post(delete_logs))
        .route(routes::ADD_DEVICE, post(add_device))
        .route(&device_path(""), get(get_device))
        .route(&device_path("/toggle"), post(toggle_device))
        .route(&device_path("/schedule"), post(save_schedule))
        .route(&device_path("/request-access"), post(request_access))
        .route(&device_path("/delete"), delete(delete_device))
        .route_layer(middleware::from_fn_with_state(token_state, optional_auth))
        .with_state(device_state)
}

pub async fn get_devices(State(state): State<DeviceState>) -> Json<Vec<Device>> {
    Json(state.lab.devices().await)
}

pub async fn get_device(
    State(state): State<DeviceState>,
    Path(device_id): Path<Id>,
) -> Result<Json<Device>, ApiError> {
    let device = state
        .lab
        .device(device_id)
        .await
        .ok_or(DeviceError::DeviceNotFound)?;

    Ok(Json(device))
}

pub async fn toggle_device(
    State(state): State<DeviceState>,
    Path(device_id): Path<Id>,
    body: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let Json(body) = body.map_err(|_| DeviceError::InvalidRequest)?;

    let device = state
        .lab
        .toggle(device_id, body.action, &body.username, OffsetDateTime::now_utc())
        .await?;

    tracing::info!(device_id, action = %body.action, username = %body.username, "device toggled");

    Ok(Json(ToggleResponse {
        message: format!("Device {} successfully!", body.action),
        device: Some(device),
    }))
}

pub async fn save_schedule(
    State(state): State<DeviceState>,
    Path(device_id): Path<Id>,
    body: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = body.map_err(|_| DeviceError::InvalidRequest)?;

    let name = state
        .lab
        .schedule(device_id, &body, OffsetDateTime::now_utc())
        .await?;

    tracing::info!(device_id, on_time = %body.on_time, off_time = %body.off_time, "schedule saved");

    Ok(Json(MessageResponse {
        message: format!(
            "Schedule set from {} to {} for {}",
            body.on_time, body.off_time, name
        ),
    }))
}

pub async fn request_access(
    State(state): State<DeviceState>,
    Path(device_id): Path<Id>,
    body: Result<Json<AccessRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = body.map_err(|_| DeviceError::InvalidRequest)?;

    let name = state
        .lab
        .request_access(device_id, &body.username, OffsetDateTime::now_utc())
        .await?;

    Ok(Json(MessageResponse {
        message: format!("Access requested for {} by {}", name, body.username),
    }))
}

pub async fn get_device_analytics(State(state): State<DeviceState>) -> Json<Vec<DeviceAnalytics>> {
    Json(state.lab.analytics().await)
}

pub async fn delete_logs(State(state): State<DeviceState>) -> Json<MessageResponse> {
    let removed = state
        .lab
        .purge_logs(OffsetDateTime::now_utc(), state.log_max_age)
        .await;

    tracing::info!(removed, "purged usage logs");

    Json(MessageResponse {
        message: format!(
            "Deleted {} log entries older than {} hours",
            removed,
            state.log_max_age.as_secs() / 3600
        ),
    })
}

pub async fn add_device(
    State(state): State<DeviceState>,
    body: Result<Json<CreateDeviceRequest>, JsonRejection>,
) -> (StatusCode, Json<Device>) {
    let body = body.map(|Json(body)| body).unwrap_or_default();

    let device = state.lab.add_device(body.name).await;

    (StatusCode::CREATED, Json(device))
}

pub async fn delete_device(
    State(state): State<DeviceState>,
    Path(device_id): Path<Id>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.lab.remove_device(device_id).await {
        return Err(DeviceError::DeviceNotFound.into());
    }

    Ok(Json(MessageResponse {
        message: format!("Device {} deleted", device_id),
    }))
}
