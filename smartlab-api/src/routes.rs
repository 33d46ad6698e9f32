//! Request paths of the lab backend, relative to the configured base URL.

use crate::models::Id;

pub const DEVICES: &str = "/devices";
pub const DEVICE_ANALYTICS: &str = "/devices/analytics";
pub const DELETE_LOGS: &str = "/devices/delete-logs";
pub const ADD_DEVICE: &str = "/devices/add";
pub const LOGS: &str = "/logs";
pub const ADD_LOG: &str = "/logs/add";
pub const LOGIN: &str = "/auth/login";
pub const REFRESH: &str = "/auth/refresh";
pub const PROTECTED: &str = "/auth/protected-route";
pub const USERS: &str = "/users";
pub const USER_ROLE: &str = "/users/role";

pub fn device(id: Id) -> String {
    format!("{DEVICES}/{id}")
}

pub fn toggle(id: Id) -> String {
    format!("{DEVICES}/{id}/toggle")
}

pub fn schedule(id: Id) -> String {
    format!("{DEVICES}/{id}/schedule")
}

pub fn request_access(id: Id) -> String {
    format!("{DEVICES}/{id}/request-access")
}

pub fn delete_device(id: Id) -> String {
    format!("{DEVICES}/{id}/delete")
}
