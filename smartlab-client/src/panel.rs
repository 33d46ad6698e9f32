use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use parking_lot::Mutex;
use smartlab_api::models::{
    Device, DeviceAnalytics, DeviceStatus, Id, MessageResponse, ToggleResponse, UsageLogEntry,
    UserRole,
};

use crate::api::LabApi;
use crate::error::{Error, Result};
use crate::gateway::AuthState;
use crate::inflight::{ActionKey, InFlight};
use crate::notify::{Confirmer, Notice, Notifier, Route};
use crate::render::{Screen, StudentDevice, regions, render};
use crate::session::Session;

pub const DELETE_LOGS_QUESTION: &str = "Delete all usage logs older than 1 day?";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Teacher,
    Student,
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Mode::Teacher => write!(f, "teacher"),
            Mode::Student => write!(f, "student"),
        }
    }
}

/// The dashboard: runs user actions against the backend, reports the outcome
/// through the notifier and keeps the screen regions current.
pub struct ControlPanel {
    api: LabApi,
    screen: Mutex<Screen>,
    inflight: InFlight,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    mode: Mode,
    log_filter: Mutex<Option<String>>,
}

impl ControlPanel {
    pub fn new(api: LabApi, notifier: Arc<dyn Notifier>, confirmer: Arc<dyn Confirmer>) -> Self {
        Self {
            api,
            screen: Mutex::new(Screen::with_regions(&[
                regions::DEVICES,
                regions::LOGS,
                regions::ANALYTICS,
            ])),
            inflight: InFlight::new(),
            notifier,
            confirmer,
            mode: Mode::default(),
            log_filter: Mutex::new(None),
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_screen(mut self, screen: Screen) -> Self {
        self.screen = Mutex::new(screen);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn screen(&self) -> Screen {
        self.screen.lock().clone()
    }

    pub fn inflight(&self) -> &InFlight {
        &self.inflight
    }

    pub async fn auth_state(&self) -> AuthState {
        self.api.gateway().state().await
    }

    pub fn cancel(&self, key: ActionKey) -> bool {
        self.inflight.cancel(key)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Option<Route>> {
        if username.trim().is_empty() || password.is_empty() {
            return self.fail(Error::validation("Username and password are required"));
        }

        let session: Session = match self.api.gateway().login(username.trim(), password).await {
            Ok(session) => session,
            Err(e) => return self.fail(e),
        };
        self.notify(Notice::Success(format!("Logged in as {}", session.username)));

        self.dashboard().await
    }

    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self.api.gateway().logout().await {
            return self.fail(e);
        }

        self.notify(Notice::Info("Logged out".to_string()));
        self.notify(Notice::Redirect(Route::Login));
        Ok(())
    }

    /// Sends the user to the dashboard matching their role.
    pub async fn dashboard(&self) -> Result<Option<Route>> {
        let role = match self.api.role().await {
            Ok(role) => role,
            Err(e) => return self.fail(e),
        };

        let route = match role.user_role() {
            UserRole::Teacher => Route::TeacherDashboard,
            UserRole::Student => Route::StudentDashboard,
            UserRole::Unknown => {
                tracing::warn!(role = %role.role, "unrecognised role");
                self.notify(Notice::Error("Role not recognized!".to_string()));
                return Ok(None);
            }
        };

        self.notify(Notice::Redirect(route));
        Ok(Some(route))
    }

    pub async fn protected(&self) -> Result<MessageResponse> {
        match self.api.protected().await {
            Ok(response) => {
                self.notify(Notice::Info(response.message.clone()));
                Ok(response)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Fetches the device list and renders it for the current mode.
    pub async fn load_devices(&self) -> Result<Vec<Device>> {
        let devices = match self.api.devices().await {
            Ok(devices) => devices,
            Err(e) => return self.fail(e),
        };

        let mut screen = self.screen.lock();
        match self.mode {
            Mode::Teacher => render(&mut screen, regions::DEVICES, &devices),
            Mode::Student => {
                let rows: Vec<_> = devices.iter().map(StudentDevice).collect();
                render(&mut screen, regions::DEVICES, &rows)
            }
        };

        Ok(devices)
    }

    pub async fn device(&self, id: Id) -> Result<Device> {
        match self.api.device(id).await {
            Ok(device) => Ok(device),
            Err(e) => self.fail(e),
        }
    }

    /// Fetches and renders the usage log. The filter is remembered for the
    /// refreshes that follow mutating actions.
    pub async fn load_logs(&self, filter: Option<&str>) -> Result<Vec<UsageLogEntry>> {
        *self.log_filter.lock() = filter.map(str::to_string);
        self.refresh_logs().await
    }

    pub async fn load_analytics(&self) -> Result<Vec<DeviceAnalytics>> {
        let analytics = match self.api.analytics().await {
            Ok(analytics) => analytics,
            Err(e) => return self.fail(e),
        };

        render(&mut self.screen.lock(), regions::ANALYTICS, &analytics);
        Ok(analytics)
    }

    /// Requests `next` for device `id`. The screen is only refreshed after
    /// the backend accepted the change.
    pub async fn toggle(&self, id: Id, next: DeviceStatus) -> Result<ToggleResponse> {
        let response = {
            let guard = match self.inflight.try_begin(ActionKey::Device(id)) {
                Ok(guard) => guard,
                Err(e) => return self.fail(e),
            };

            tracing::debug!(id, action = %next, "toggling device");
            guard.run(self.api.toggle(id, next)).await
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => return self.fail(e),
        };
        self.notify(Notice::Success(response.message.clone()));

        self.refresh_after_change(true).await;
        Ok(response)
    }

    /// Toggles device `id` away from the status it was last rendered with,
    /// asking the backend when it is not on screen.
    pub async fn toggle_rendered(&self, id: Id) -> Result<ToggleResponse> {
        let rendered = self.screen.lock().rendered_status(id);

        let current = match rendered {
            Some(status) => status,
            None => self.device(id).await?.status,
        };

        self.toggle(id, current.toggled()).await
    }

    pub async fn schedule(&self, id: Id, on_time: &str, off_time: &str) -> Result<MessageResponse> {
        let (on_time, off_time) = (on_time.trim(), off_time.trim());
        if on_time.is_empty() || off_time.is_empty() {
            return self.fail(Error::validation("Please select both ON and OFF times."));
        }

        let response = {
            let guard = match self.inflight.try_begin(ActionKey::Device(id)) {
                Ok(guard) => guard,
                Err(e) => return self.fail(e),
            };

            guard.run(self.api.schedule(id, on_time, off_time)).await
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => return self.fail(e),
        };
        self.notify(Notice::Success(response.message.clone()));

        self.refresh_after_change(false).await;
        Ok(response)
    }

    pub async fn request_access(&self, id: Id) -> Result<MessageResponse> {
        let response = {
            let guard = match self.inflight.try_begin(ActionKey::Device(id)) {
                Ok(guard) => guard,
                Err(e) => return self.fail(e),
            };

            guard.run(self.api.request_access(id)).await
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => return self.fail(e),
        };
        self.notify(Notice::Success(response.message.clone()));

        self.refresh_after_change(false).await;
        Ok(response)
    }

    /// Asks for confirmation first; `Ok(None)` means the user declined and
    /// nothing was sent.
    pub async fn delete_logs(&self) -> Result<Option<MessageResponse>> {
        let response = {
            let guard = match self.inflight.try_begin(ActionKey::Logs) {
                Ok(guard) => guard,
                Err(e) => return self.fail(e),
            };

            if !self.confirmer.confirm(DELETE_LOGS_QUESTION).await {
                self.notify(Notice::Info("Log deletion cancelled".to_string()));
                return Ok(None);
            }

            guard.run(self.api.delete_logs()).await
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => return self.fail(e),
        };
        self.notify(Notice::Success(response.message.clone()));

        self.refresh_after_change(false).await;
        Ok(Some(response))
    }

    async fn refresh_logs(&self) -> Result<Vec<UsageLogEntry>> {
        let filter = self.log_filter.lock().clone();

        let entries = match self.api.logs(filter.as_deref()).await {
            Ok(entries) => entries,
            Err(e) => return self.fail(e),
        };

        render(&mut self.screen.lock(), regions::LOGS, &entries);
        Ok(entries)
    }

    /// Failures here were already reported and do not undo the change.
    async fn refresh_after_change(&self, devices: bool) {
        if devices {
            let _ = self.load_devices().await;
        }
        let _ = self.refresh_logs().await;
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    fn fail<T>(&self, err: Error) -> Result<T> {
        self.report(&err);
        Err(err)
    }

    /// Makes a failure visible. Losing the session also sends the user back
    /// to the login page.
    pub fn report(&self, err: &Error) {
        tracing::error!("{}", err);

        match err {
            Error::SessionExpired | Error::NotAuthenticated => {
                self.notify(Notice::Error(err.to_string()));
                self.notify(Notice::Redirect(Route::Login));
            }
            Error::Http { message, .. } => self.notify(Notice::Error(message.clone())),
            _ => self.notify(Notice::Error(err.to_string())),
        }
    }
}
