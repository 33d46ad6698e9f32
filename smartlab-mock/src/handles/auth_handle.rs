use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use smartlab_api::models::*;
use smartlab_api::routes;

use crate::errors::{ApiError, AuthError};
use crate::middlewares::{TokenState, auth, bearer_token};
use crate::services::{AuthService, LabService, TokenClaims, TokenService};

#[derive(Clone)]
pub struct AuthState {
    pub auth_service: Arc<AuthService>,
    pub token_service: Arc<TokenService>,
    pub lab: Arc<LabService>,
}

pub fn auth_router(auth_state: AuthState, token_state: TokenState) -> Router {
    Router::new()
        .route(routes::LOGIN, post(login))
        .route(routes::REFRESH, post(refresh_token))
        .route(
            routes::PROTECTED,
            get(protected).route_layer(middleware::from_fn_with_state(token_state, auth)),
        )
        .with_state(auth_state)
}

pub async fn login(
    State(state): State<AuthState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AuthError::MissingCredentials.into());
    }

    let user = state
        .lab
        .find_user(body.username.trim())
        .await
        .ok_or(AuthError::InvalidCredentials)?;

    let verified = state
        .auth_service
        .verify_user(&user, &body.password)
        .map_err(|e| anyhow!("Failed to verify password: {}", e))?;

    if !verified {
        return Err(AuthError::InvalidCredentials.into());
    }

    let pair = state
        .token_service
        .generate_pair(&user.username, &user.role.to_string())
        .map_err(|e| anyhow!("Failed to generate token: {}", e))?;

    tracing::info!(username = %user.username, "user logged in");

    Ok(Json(pair))
}

pub async fn refresh_token(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<TokenPair>, ApiError> {
    let token = bearer_token(&headers)
        .map_err(|_| AuthError::InvalidRefreshToken)?
        .ok_or(AuthError::MissingRefreshToken)?;

    let claims = state.token_service.retrieve_refresh_claims(&token)?;

    let user = state
        .lab
        .find_user(&claims.sub)
        .await
        .ok_or(AuthError::InvalidRefreshToken)?;

    let pair = state
        .token_service
        .generate_pair(&user.username, &user.role.to_string())
        .map_err(|e| anyhow!("Failed to generate token: {}", e))?;

    tracing::debug!(username = %user.username, "token pair rotated");

    Ok(Json(pair))
}

pub async fn protected(Extension(claims): Extension<TokenClaims>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("Hello {}, this is protected data", claims.sub),
    })
}
