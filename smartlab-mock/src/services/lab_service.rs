use std::collections::HashMap;
use std::time::Duration;

use argon2::password_hash;
use serde_json::{Value, json};
use smartlab_api::models::*;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tokio::sync::RwLock;

use crate::errors::DeviceError;
use crate::services::AuthService;

macro_rules! timestamp_format {
    () => {
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]")
    };
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Debug, Default)]
struct LabState {
    devices: Vec<Device>,
    users: Vec<User>,
    /// Free-form entries, kept as sent so `/logs/add` can store anything
    logs: Vec<Value>,
    /// Start of the current on-period per device
    powered_since: HashMap<Id, OffsetDateTime>,
}

pub struct LabService {
    state: RwLock<LabState>,
}

impl LabService {
    pub fn new(devices: Vec<Device>, users: Vec<User>) -> Self {
        Self {
            state: RwLock::new(LabState {
                devices,
                users,
                ..Default::default()
            }),
        }
    }

    /// The classroom the mock starts with.
    pub fn seeded(auth_service: &AuthService) -> Result<Self, password_hash::Error> {
        let devices = vec![
            device(1, "Projector", DeviceStatus::Off, 0.0),
            device(2, "Smart Light", DeviceStatus::Off, 3.5),
            device(3, "Fan", DeviceStatus::On, 1.2),
        ];

        let users = vec![
            User {
                id: 1,
                username: "teacher1".to_string(),
                password_hash: auth_service.hash("pass123")?,
                role: UserRole::Teacher,
            },
            User {
                id: 2,
                username: "student1".to_string(),
                password_hash: auth_service.hash("pass123")?,
                role: UserRole::Student,
            },
            User {
                id: 3,
                username: "admin".to_string(),
                password_hash: auth_service.hash("securepassword")?,
                role: UserRole::Teacher,
            },
        ];

        Ok(Self::new(devices, users))
    }

    pub async fn devices(&self) -> Vec<Device> {
        self.state.read().await.devices.clone()
    }

    pub async fn device(&self, id: Id) -> Option<Device> {
        self.state
            .read()
            .await
            .devices
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    pub async fn add_device(&self, name: Option<String>) -> Device {
        let mut state = self.state.write().await;

        let id = state.devices.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        let created = device(
            id,
            &name.unwrap_or_else(|| "Unnamed Device".to_string()),
            DeviceStatus::Off,
            0.0,
        );
        state.devices.push(created.clone());

        created
    }

    pub async fn remove_device(&self, id: Id) -> bool {
        let mut state = self.state.write().await;
        let before = state.devices.len();
        state.devices.retain(|d| d.id != id);
        state.powered_since.remove(&id);

        state.devices.len() != before
    }

    pub async fn toggle(
        &self,
        id: Id,
        action: DeviceStatus,
        username: &str,
        now: OffsetDateTime,
    ) -> Result<Device, DeviceError> {
        if action == DeviceStatus::Unknown {
            return Err(DeviceError::InvalidRequest);
        }

        let mut state = self.state.write().await;
        let LabState {
            devices,
            logs,
            powered_since,
            ..
        } = &mut *state;

        let device = devices
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(DeviceError::DeviceNotFound)?;

        device.status = action;

        match action {
            DeviceStatus::On => {
                powered_since.insert(id, now);
            }
            _ => {
                if let Some(since) = powered_since.remove(&id) {
                    let hours = (now - since).as_seconds_f64().max(0.0) / 3600.0;
                    *device.total_usage_hours.get_or_insert(0.0) += hours;
                }
            }
        }

        logs.push(json!({
            "action": action.to_string(),
            "device": device.name,
            "username": username,
            "timestamp": format_timestamp(now),
        }));

        Ok(device.clone())
    }

    pub async fn schedule(
        &self,
        id: Id,
        request: &ScheduleRequest,
        now: OffsetDateTime,
    ) -> Result<String, DeviceError> {
        if request.on_time.trim().is_empty() || request.off_time.trim().is_empty() {
            return Err(DeviceError::MissingScheduleTime);
        }

        let mut state = self.state.write().await;
        let name = state
            .devices
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.name.clone())
            .ok_or(DeviceError::DeviceNotFound)?;

        let window = ScheduleWindow {
            start_time: request.on_time.clone(),
            end_time: request.off_time.clone(),
        };
        state.logs.push(json!({
            "action": "schedule_set",
            "device": name,
            "username": request.username,
            "timestamp": format_timestamp(now),
            "schedule": window,
        }));

        Ok(name)
    }

    pub async fn request_access(
        &self,
        id: Id,
        username: &str,
        now: OffsetDateTime,
    ) -> Result<String, DeviceError> {
        let mut state = self.state.write().await;
        let name = state
            .devices
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.name.clone())
            .ok_or(DeviceError::DeviceNotFound)?;

        state.logs.push(json!({
            "action": "request",
            "device": name,
            "username": username,
            "timestamp": format_timestamp(now),
        }));

        Ok(name)
    }

    pub async fn analytics(&self) -> Vec<DeviceAnalytics> {
        self.state
            .read()
            .await
            .devices
            .iter()
            .map(|d| DeviceAnalytics {
                name: d.name.clone(),
                status: d.status,
                total_usage_hours: d.total_usage_hours.unwrap_or(0.0),
            })
            .collect()
    }

    /// Log entries in insertion order. The filter matches a device name
    /// case-insensitively, or a device id.
    pub async fn logs(&self, filter: Option<&str>) -> Vec<Value> {
        let state = self.state.read().await;

        let filter = match filter.map(str::trim) {
            Some(f) if !f.is_empty() && !f.eq_ignore_ascii_case("all") => f,
            _ => return state.logs.clone(),
        };

        let by_id = filter
            .parse::<Id>()
            .ok()
            .and_then(|id| state.devices.iter().find(|d| d.id == id));

        state
            .logs
            .iter()
            .filter(|entry| {
                let name = entry.get("device").and_then(Value::as_str);
                let device_id = entry.get("device_id").and_then(Value::as_i64);

                name.is_some_and(|n| n.eq_ignore_ascii_case(filter))
                    || by_id.is_some_and(|d| name == Some(d.name.as_str()) || device_id == Some(d.id))
            })
            .cloned()
            .collect()
    }

    pub async fn append_log(&self, entry: Value) {
        self.state.write().await.logs.push(entry);
    }

    /// Removes entries whose timestamp is older than `max_age`. Entries
    /// without a readable timestamp are kept.
    pub async fn purge_logs(&self, now: OffsetDateTime, max_age: Duration) -> usize {
        let cutoff = now - max_age;
        let mut state = self.state.write().await;
        let before = state.logs.len();

        state.logs.retain(|entry| {
            entry
                .get("timestamp")
                .and_then(Value::as_str)
                .and_then(parse_timestamp)
                .is_none_or(|at| at >= cutoff)
        });

        before - state.logs.len()
    }

    pub async fn find_user(&self, username: &str) -> Option<User> {
        self.state
            .read()
            .await
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    pub async fn users(&self) -> Vec<UserSummary> {
        self.state
            .read()
            .await
            .users
            .iter()
            .map(|u| UserSummary {
                id: u.id,
                username: u.username.clone(),
                role: u.role.clone(),
            })
            .collect()
    }
}

fn device(id: Id, name: &str, status: DeviceStatus, hours: f64) -> Device {
    Device {
        id,
        name: name.to_string(),
        status,
        total_usage_hours: Some(hours),
    }
}

pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(timestamp_format!()).unwrap_or_default()
}

pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    PrimitiveDateTime::parse(value, timestamp_format!())
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn lab() -> LabService {
        LabService::new(
            vec![
                device(1, "Projector", DeviceStatus::Off, 0.0),
                device(2, "Fan", DeviceStatus::On, 1.0),
            ],
            vec![],
        )
    }

    #[tokio::test]
    async fn test_toggle_tracks_usage_hours() {
        let lab = lab();
        let start = datetime!(2025-03-01 08:00:00 UTC);

        lab.toggle(1, DeviceStatus::On, "teacher1", start).await.unwrap();
        let device = lab
            .toggle(1, DeviceStatus::Off, "teacher1", start + Duration::from_secs(5400))
            .await
            .unwrap();

        assert_eq!(device.status, DeviceStatus::Off);
        assert_eq!(device.total_usage_hours, Some(1.5));

        let logs = lab.logs(None).await;
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0]["action"], "on");
        assert_eq!(logs[0]["device"], "Projector");
        assert_eq!(logs[1]["timestamp"], "2025-03-01 09:30:00");
    }

    #[tokio::test]
    async fn test_toggle_rejects_unknown_device_and_action() {
        let lab = lab();
        let now = datetime!(2025-03-01 08:00:00 UTC);

        assert!(matches!(
            lab.toggle(9, DeviceStatus::On, "teacher1", now).await,
            Err(DeviceError::DeviceNotFound)
        ));
        assert!(matches!(
            lab.toggle(1, DeviceStatus::Unknown, "teacher1", now).await,
            Err(DeviceError::InvalidRequest)
        ));
        assert!(lab.logs(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_logs_filter_by_name_or_id() {
        let lab = lab();
        let now = datetime!(2025-03-01 08:00:00 UTC);

        lab.toggle(1, DeviceStatus::On, "teacher1", now).await.unwrap();
        lab.toggle(2, DeviceStatus::Off, "teacher1", now).await.unwrap();
        lab.append_log(json!({"device_id": 2, "action": "off"})).await;

        assert_eq!(lab.logs(Some("projector")).await.len(), 1);
        assert_eq!(lab.logs(Some("2")).await.len(), 2);
        assert_eq!(lab.logs(Some("All")).await.len(), 3);
        assert!(lab.logs(Some("Heater")).await.is_empty());
    }

    #[tokio::test]
    async fn test_purge_only_removes_old_entries() {
        let lab = lab();
        let now = datetime!(2025-03-02 12:00:00 UTC);

        lab.append_log(json!({"action": "on", "timestamp": "2025-03-01 11:59:59"})).await;
        lab.append_log(json!({"action": "on", "timestamp": "2025-03-01 12:00:00"})).await;
        lab.append_log(json!({"action": "on", "timestamp": "yesterday"})).await;
        lab.append_log(json!({"action": "on"})).await;

        let removed = lab.purge_logs(now, Duration::from_secs(86400)).await;

        assert_eq!(removed, 1);
        assert_eq!(lab.logs(None).await.len(), 3);
    }

    #[tokio::test]
    async fn test_add_and_remove_device() {
        let lab = lab();

        let created = lab.add_device(None).await;
        assert_eq!(created.id, 3);
        assert_eq!(created.name, "Unnamed Device");

        assert!(lab.remove_device(3).await);
        assert!(!lab.remove_device(3).await);
    }
}
