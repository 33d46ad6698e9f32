use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handles::*;
use crate::middlewares::TokenState;
use crate::services::{AuthService, LabService, TokenService};
use crate::settings::Settings;

pub fn create_app(settings: &Settings) -> anyhow::Result<Router> {
    let auth_service = Arc::new(AuthService::new());
    let token_service = Arc::new(TokenService::new(settings.auth.clone()));
    let lab = Arc::new(
        LabService::seeded(&auth_service)
            .map_err(|e| anyhow::anyhow!("Failed to seed users: {}", e))?,
    );

    Ok(create_router(lab, auth_service, token_service, settings))
}

pub fn create_router(
    lab: Arc<LabService>,
    auth_service: Arc<AuthService>,
    token_service: Arc<TokenService>,
    settings: &Settings,
) -> Router {
    let token_state = TokenState {
        token_service: token_service.clone(),
    };

    Router::new()
        .merge(auth_router(
            AuthState {
                auth_service,
                token_service,
                lab: lab.clone(),
            },
            token_state.clone(),
        ))
        .merge(user_router(UserState { lab: lab.clone() }, token_state.clone()))
        .merge(device_router(
            DeviceState {
                lab: lab.clone(),
                log_max_age: settings.retention.max_age(),
            },
            token_state.clone(),
        ))
        .merge(log_router(LogState { lab }, token_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
