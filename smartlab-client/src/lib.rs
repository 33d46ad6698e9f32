pub mod api;
pub mod cli;
pub mod configs;
pub mod error;
pub mod gateway;
pub mod inflight;
pub mod notify;
pub mod panel;
pub mod render;
pub mod session;

pub use api::LabApi;
pub use error::{Error, Result};
pub use gateway::{ApiRequest, AuthGateway, AuthState};
pub use inflight::{ActionKey, InFlight};
pub use notify::{AutoConfirm, ChannelNotifier, Confirmer, Notice, Notifier, Route};
pub use panel::{ControlPanel, Mode};
pub use render::{Render, Row, Screen, render};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionHandle, SessionStore};
