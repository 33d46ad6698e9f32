use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ScheduleWindow;

/// One usage record. Every field is optional on the wire; older backends
/// send `user`/`time` instead of `username`/`timestamp`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLogEntry {
    #[serde(default, alias = "user", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, alias = "time", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleWindow>,
}

impl UsageLogEntry {
    /// Field-by-field extraction that never fails. Scalars of the wrong type
    /// are stringified, empty strings and structured values count as absent.
    pub fn from_value(value: &Value) -> Self {
        Self {
            username: lenient_field(value, &["username", "user"]),
            device: lenient_field(value, &["device"]),
            action: lenient_field(value, &["action"]),
            timestamp: lenient_field(value, &["timestamp", "time"]),
            schedule: value
                .get("schedule")
                .and_then(|s| serde_json::from_value(s.clone()).ok()),
        }
    }
}

fn lenient_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find_map(|field| match field {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogQuery {
    /// Device name or identifier to filter by
    pub device: Option<String>,
}
