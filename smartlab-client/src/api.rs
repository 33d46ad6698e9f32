use serde_json::Value;
use smartlab_api::models::{
    AccessRequest, Device, DeviceAnalytics, DeviceStatus, Id, MessageResponse, RoleResponse,
    ScheduleRequest, ToggleRequest, ToggleResponse, UsageLogEntry,
};
use smartlab_api::routes;

use crate::error::{Error, Result};
use crate::gateway::{ApiRequest, AuthGateway};

/// Typed calls for every backend endpoint the control panel uses.
pub struct LabApi {
    gateway: AuthGateway,
}

impl LabApi {
    pub fn new(gateway: AuthGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    /// Fields are normalised per record; only records without a usable id
    /// are dropped, with a warning, instead of failing the whole list.
    pub async fn devices(&self) -> Result<Vec<Device>> {
        let body: Value = self.gateway.fetch(&ApiRequest::get(routes::DEVICES)).await?;
        let records = expect_array(routes::DEVICES, body)?;

        let mut devices = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::from_value::<Device>(record) {
                Ok(device) => devices.push(device),
                Err(e) => tracing::warn!("skipping malformed device record: {}", e),
            }
        }

        Ok(devices)
    }

    pub async fn device(&self, id: Id) -> Result<Device> {
        self.gateway.fetch(&ApiRequest::get(routes::device(id))).await
    }

    pub async fn toggle(&self, id: Id, action: DeviceStatus) -> Result<ToggleResponse> {
        let body = ToggleRequest {
            action,
            username: self.gateway.session().username().await,
        };

        let request = ApiRequest::post(routes::toggle(id)).json(&body)?;
        self.gateway.fetch(&request).await
    }

    pub async fn schedule(&self, id: Id, on_time: &str, off_time: &str) -> Result<MessageResponse> {
        let body = ScheduleRequest {
            on_time: on_time.to_string(),
            off_time: off_time.to_string(),
            username: self.gateway.session().username().await,
        };

        let request = ApiRequest::post(routes::schedule(id)).json(&body)?;
        self.gateway.fetch(&request).await
    }

    pub async fn request_access(&self, id: Id) -> Result<MessageResponse> {
        let body = AccessRequest {
            device_id: id,
            username: self.gateway.session().username().await,
        };

        let request = ApiRequest::post(routes::request_access(id)).json(&body)?;
        self.gateway.fetch(&request).await
    }

    pub async fn analytics(&self) -> Result<Vec<DeviceAnalytics>> {
        self.gateway
            .fetch(&ApiRequest::get(routes::DEVICE_ANALYTICS))
            .await
    }

    pub async fn delete_logs(&self) -> Result<MessageResponse> {
        self.gateway.fetch(&ApiRequest::post(routes::DELETE_LOGS)).await
    }

    /// Usage log in arrival order. `All` or a blank filter asks for every entry.
    pub async fn logs(&self, device: Option<&str>) -> Result<Vec<UsageLogEntry>> {
        let mut request = ApiRequest::get(routes::LOGS);
        if let Some(device) = device.map(str::trim) {
            if !device.is_empty() && !device.eq_ignore_ascii_case("all") {
                request = request.query("device", device);
            }
        }

        let body: Value = self.gateway.fetch(&request).await?;
        let records = expect_array(routes::LOGS, body)?;

        Ok(records
            .iter()
            .map(|record| {
                if !record.is_object() {
                    tracing::warn!(%record, "log record is not an object");
                }
                UsageLogEntry::from_value(record)
            })
            .collect())
    }

    pub async fn role(&self) -> Result<RoleResponse> {
        self.gateway.fetch(&ApiRequest::get(routes::USER_ROLE)).await
    }

    pub async fn protected(&self) -> Result<MessageResponse> {
        self.gateway.fetch(&ApiRequest::get(routes::PROTECTED)).await
    }
}

fn expect_array(endpoint: &str, body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(records) => Ok(records),
        other => Err(Error::serialization(format!(
            "expected a list from {endpoint}, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
