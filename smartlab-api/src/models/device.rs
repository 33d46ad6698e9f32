use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::Id;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum DeviceStatus {
    On,
    #[default]
    Off,
    /// Any status string the backend sends that is neither `on` nor `off`.
    Unknown,
}

impl From<String> for DeviceStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(DeviceStatus::Unknown)
    }
}

impl DeviceStatus {
    pub fn is_on(self) -> bool {
        matches!(self, DeviceStatus::On)
    }

    /// Status a toggle control requests next. Anything not `on` is switched on.
    pub fn toggled(self) -> Self {
        match self {
            DeviceStatus::On => DeviceStatus::Off,
            _ => DeviceStatus::On,
        }
    }

    /// Caption of the toggle control for a device currently in this status.
    pub fn control_label(self) -> &'static str {
        match self {
            DeviceStatus::On => "Turn Off",
            _ => "Turn On",
        }
    }
}

impl Display for DeviceStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DeviceStatus::On => write!(f, "on"),
            DeviceStatus::Off => write!(f, "off"),
            DeviceStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for DeviceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(DeviceStatus::On),
            "off" => Ok(DeviceStatus::Off),
            other => Err(format!("invalid device status '{other}', expected 'on' or 'off'")),
        }
    }
}

/// A device row as the backend reports it. Only `id` is mandatory; a `null`,
/// missing or mistyped name, status or usage figure falls back per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Device identifier, numeric or a numeric string
    #[serde(deserialize_with = "lenient_id")]
    pub id: Id,
    /// Display name
    #[serde(default = "unknown_device", deserialize_with = "lenient_name")]
    pub name: String,
    /// Current power state
    #[serde(default = "unknown_status", deserialize_with = "lenient_status")]
    pub status: DeviceStatus,
    /// Accumulated on-time in hours, when the backend tracks it
    #[serde(
        default,
        deserialize_with = "lenient_hours",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_usage_hours: Option<f64>,
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Id, D::Error> {
    let value = Value::deserialize(deserializer)?;

    let id = match &value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };

    id.ok_or_else(|| serde::de::Error::custom(format!("unusable device id {value}")))
}

fn lenient_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => s,
        Value::Number(n) => n.to_string(),
        _ => unknown_device(),
    })
}

fn lenient_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DeviceStatus, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => DeviceStatus::from(s),
        _ => DeviceStatus::Unknown,
    })
}

fn lenient_hours<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn unknown_status() -> DeviceStatus {
    DeviceStatus::Unknown
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleRequest {
    /// Requested next status
    pub action: DeviceStatus,
    /// Acting user, `Unknown` when no session exists
    #[serde(default = "unknown_user")]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub message: String,
    /// Updated device, omitted by older backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default)]
    pub on_time: String,
    #[serde(default)]
    pub off_time: String,
    #[serde(default = "unknown_user")]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub device_id: Id,
    #[serde(default = "unknown_user")]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAnalytics {
    pub name: String,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default)]
    pub total_usage_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDeviceRequest {
    pub name: Option<String>,
}

pub fn unknown_user() -> String {
    String::from("Unknown")
}

pub fn unknown_device() -> String {
    String::from("Unknown Device")
}
