#![allow(dead_code)]

pub mod fake_lab;

use std::sync::Arc;

use smartlab_client::configs::Settings;
use smartlab_client::{
    AuthGateway, AutoConfirm, ChannelNotifier, ControlPanel, LabApi, MemorySessionStore, Notice,
    Session, SessionHandle, SessionStore,
};
use smartlab_mock::services::{TokenClaims, TokenKind, TokenService, now};
use tokio::sync::mpsc::UnboundedReceiver;

pub struct TestPanel {
    pub panel: Arc<ControlPanel>,
    pub notices: UnboundedReceiver<Notice>,
    pub session: SessionHandle,
}

impl TestPanel {
    /// Notices emitted so far, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            notices.push(notice);
        }
        notices
    }
}

pub fn settings(base_url: &str) -> Settings {
    let mut settings = Settings::default();
    settings.api.base_url = base_url.to_string();
    settings
}

pub async fn panel(settings: &Settings, session: Option<Session>, confirm: bool) -> TestPanel {
    panel_with(settings, session, confirm, |panel| panel).await
}

pub async fn panel_with<F>(
    settings: &Settings,
    session: Option<Session>,
    confirm: bool,
    customize: F,
) -> TestPanel
where
    F: FnOnce(ControlPanel) -> ControlPanel,
{
    let store: Arc<dyn SessionStore> = match session {
        Some(session) => Arc::new(MemorySessionStore::with_session(session)),
        None => Arc::new(MemorySessionStore::new()),
    };
    let session = SessionHandle::load(store).await.unwrap();

    let gateway = AuthGateway::new(settings, session.clone()).unwrap();
    let (notifier, notices) = ChannelNotifier::channel();

    let panel = ControlPanel::new(
        LabApi::new(gateway),
        Arc::new(notifier),
        Arc::new(AutoConfirm(confirm)),
    );

    TestPanel {
        panel: Arc::new(customize(panel)),
        notices,
        session,
    }
}

/// Starts the mock backend and returns its base URL.
pub async fn spawn_mock() -> String {
    let settings = smartlab_mock::settings::Settings::new().unwrap();
    let address = smartlab_mock::spawn(&settings).await.unwrap();

    format!("http://{}", address)
}

pub fn token_service() -> TokenService {
    let settings = smartlab_mock::settings::Settings::new().unwrap();
    TokenService::new(settings.auth)
}

pub fn session_for(username: &str, role: &str) -> Session {
    let tokens = token_service().generate_pair(username, role).unwrap();

    Session {
        username: username.to_string(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }
}

/// A session whose access token expired a minute ago but can still be refreshed.
pub fn expired_session_for(username: &str, role: &str) -> Session {
    let service = token_service();
    let issued = now() - 3600;

    let access_token = service
        .encode_claims(&TokenClaims {
            sub: username.to_string(),
            role: role.to_string(),
            kind: TokenKind::Access,
            jti: "expired".to_string(),
            iat: issued,
            exp: now() - 60,
        })
        .unwrap();

    Session {
        access_token,
        ..session_for(username, role)
    }
}
