//! Turns backend records into rows of a named screen region.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use smartlab_api::models::{Device, DeviceAnalytics, DeviceStatus, Id, UsageLogEntry};

pub const UNKNOWN_USER: &str = "Unknown";
pub const UNKNOWN_DEVICE: &str = "Unknown Device";
pub const UNKNOWN_ACTION: &str = "Unknown Action";
pub const NO_TIME: &str = "No Time Available";

/// Region names used by the control panel.
pub mod regions {
    pub const DEVICES: &str = "devices";
    pub const LOGS: &str = "logs";
    pub const ANALYTICS: &str = "analytics";
}

#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Device {
        id: Id,
        name: String,
        status: DeviceStatus,
        control: &'static str,
    },
    /// Read-only device line shown to students.
    DeviceStatus {
        id: Id,
        name: String,
        status: String,
    },
    Log {
        username: String,
        device: String,
        action: String,
        timestamp: String,
        schedule: Option<String>,
    },
    Analytics {
        name: String,
        status: DeviceStatus,
        hours: f64,
    },
}

impl Display for Row {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Row::Device {
                id,
                name,
                status,
                control,
            } => write!(f, "[{}] {} - Status: {} [{}]", id, name, status, control),
            Row::DeviceStatus { id, name, status } => {
                write!(f, "[{}] {} - Status: {}", id, name, status)
            }
            Row::Log {
                username,
                device,
                action,
                timestamp,
                schedule,
            } => {
                write!(f, "{} {} {} at {}", username, action, device, timestamp)?;
                if let Some(schedule) = schedule {
                    write!(f, " ({})", schedule)?;
                }
                Ok(())
            }
            Row::Analytics {
                name,
                status,
                hours,
            } => write!(f, "{} {} {:.1} h", name, status, hours),
        }
    }
}

pub trait Render {
    fn row(&self) -> Row;
}

impl Render for Device {
    fn row(&self) -> Row {
        Row::Device {
            id: self.id,
            name: self.name.clone(),
            status: self.status,
            control: self.status.control_label(),
        }
    }
}

/// Student view of a device: status only, no control.
pub struct StudentDevice<'a>(pub &'a Device);

impl Render for StudentDevice<'_> {
    fn row(&self) -> Row {
        Row::DeviceStatus {
            id: self.0.id,
            name: self.0.name.clone(),
            status: self.0.status.to_string().to_uppercase(),
        }
    }
}

impl Render for UsageLogEntry {
    fn row(&self) -> Row {
        Row::Log {
            username: self
                .username
                .clone()
                .unwrap_or_else(|| UNKNOWN_USER.to_string()),
            device: self
                .device
                .clone()
                .unwrap_or_else(|| UNKNOWN_DEVICE.to_string()),
            action: self
                .action
                .as_deref()
                .map(str::to_uppercase)
                .unwrap_or_else(|| UNKNOWN_ACTION.to_string()),
            timestamp: self
                .timestamp
                .clone()
                .unwrap_or_else(|| NO_TIME.to_string()),
            schedule: self
                .schedule
                .as_ref()
                .map(|s| format!("{} - {}", s.start_time, s.end_time)),
        }
    }
}

impl Render for DeviceAnalytics {
    fn row(&self) -> Row {
        Row::Analytics {
            name: self.name.clone(),
            status: self.status,
            hours: self.total_usage_hours,
        }
    }
}

/// Named mount points and their current rows.
#[derive(Debug, Clone, Default)]
pub struct Screen {
    regions: BTreeMap<String, Vec<Row>>,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regions(names: &[&str]) -> Self {
        let mut screen = Self::new();
        for name in names {
            screen.mount(name);
        }
        screen
    }

    /// Adds an empty region. Existing rows are kept if already mounted.
    pub fn mount(&mut self, name: &str) {
        self.regions.entry(name.to_string()).or_default();
    }

    pub fn is_mounted(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    pub fn region(&self, name: &str) -> Option<&[Row]> {
        self.regions.get(name).map(Vec::as_slice)
    }

    /// Status of `id` as last rendered in the devices region.
    pub fn rendered_status(&self, id: Id) -> Option<DeviceStatus> {
        self.region(regions::DEVICES)?
            .iter()
            .find_map(|row| match row {
                Row::Device {
                    id: row_id, status, ..
                } if *row_id == id => Some(*status),
                _ => None,
            })
    }

    pub fn lines(&self, name: &str) -> Vec<String> {
        self.region(name)
            .map(|rows| rows.iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }
}

/// Replaces the rows of region `name` with one row per item. A missing
/// region is logged and left alone; returns the number of rows written.
pub fn render<R: Render>(screen: &mut Screen, name: &str, items: &[R]) -> Option<usize> {
    let Some(rows) = screen.regions.get_mut(name) else {
        tracing::error!(region = name, "render target not mounted");
        return None;
    };

    rows.clear();
    rows.extend(items.iter().map(Render::row));

    Some(rows.len())
}
