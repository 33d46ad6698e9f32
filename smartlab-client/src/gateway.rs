//! Request layer that owns authentication: it attaches the bearer token and
//! performs the single refresh-and-retry after an authorization failure.

use std::fmt::{self, Display, Formatter};

use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smartlab_api::models::{ErrorResponse, LoginRequest, MessageResponse, TokenPair};
use smartlab_api::routes;

use crate::configs::Settings;
use crate::error::{Error, Result};
use crate::session::{Session, SessionHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
    Refreshing,
}

impl Display for AuthState {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
            AuthState::Authenticated => write!(f, "authenticated"),
            AuthState::Refreshing => write!(f, "refreshing"),
        }
    }
}

/// A request that can be replayed after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get<P: Into<String>>(path: P) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post<P: Into<String>>(path: P) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(path)
        }
    }

    pub fn query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

pub struct AuthGateway {
    http: Client,
    base_url: String,
    session: SessionHandle,
}

impl AuthGateway {
    pub fn new(settings: &Settings, session: SessionHandle) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .connect_timeout(settings.connect_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: settings.api.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn state(&self) -> AuthState {
        if self.session.is_refreshing() {
            AuthState::Refreshing
        } else if self.session.current().await.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }

    /// Exchanges credentials for a token pair and stores the new session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .http
            .post(self.url(routes::LOGIN))
            .json(&body)
            .send()
            .await?;
        let tokens: TokenPair = Self::parse(routes::LOGIN, response).await?;

        let session = Session {
            username: username.to_string(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        };
        self.session.replace(session.clone()).await?;

        tracing::info!(username, "logged in");

        Ok(session)
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.clear().await?;
        tracing::info!("session cleared");
        Ok(())
    }

    /// Sends `request` and decodes a successful JSON body.
    pub async fn fetch<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        Self::parse(&request.path, response).await
    }

    /// Sends `request` with the current access token. A 401 triggers one
    /// refresh and one replay; the replayed response is returned whatever
    /// its status.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response> {
        let sent_token = self.session.access_token().await;

        let response = self.dispatch(request, sent_token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(sent_token) = sent_token else {
            return Err(Error::NotAuthenticated);
        };

        let token = self.refresh_after(&sent_token).await?;

        tracing::debug!(path = %request.path, "replaying request after token refresh");

        self.dispatch(request, Some(&token)).await
    }

    /// Returns a usable access token newer than `stale`. Only one caller
    /// refreshes at a time; later callers pick up the rotated token.
    async fn refresh_after(&self, stale: &str) -> Result<String> {
        let _guard = self.session.lock_refresh().await;

        let Some(current) = self.session.current().await else {
            return Err(Error::SessionExpired);
        };

        if current.access_token != stale {
            return Ok(current.access_token);
        }

        match self.refresh(&current.refresh_token).await {
            Ok(tokens) => {
                let session = self.session.rotate(tokens).await?;
                tracing::info!(username = %session.username, "access token refreshed");
                Ok(session.access_token)
            }
            Err(e) => {
                tracing::warn!("token refresh failed: {}", e);
                self.session.clear().await?;
                Err(Error::SessionExpired)
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let response = self
            .http
            .post(self.url(routes::REFRESH))
            .bearer_auth(refresh_token)
            .send()
            .await?;

        Self::parse(routes::REFRESH, response).await
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::trace!(method = %request.method, path = %request.path, "sending request");

        Ok(builder.send().await?)
    }

    async fn parse<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let text = response.text().await.unwrap_or_default();
        Err(Error::http(status, endpoint, error_message(status, &text)))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Best human-readable message from an error body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(error) = serde_json::from_str::<ErrorResponse>(body) {
        return error.error;
    }
    if let Ok(message) = serde_json::from_str::<MessageResponse>(body) {
        return message.message;
    }

    match body.trim() {
        "" => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
        text => text.to_string(),
    }
}
